use crate::assignments;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{Assignment, User};
use crate::store::RecordStore;
use serde_json::json;

struct HandlerErr {
    code: &'static str,
    message: String,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, None)
    }
}

fn storage_err(e: anyhow::Error) -> HandlerErr {
    HandlerErr {
        code: "storage_read_failed",
        message: format!("{e:?}"),
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: format!("missing {}", key),
        })
}

fn get_filter(params: &serde_json::Value, allowed: &[&str]) -> Result<String, HandlerErr> {
    let raw = params
        .get("filter")
        .and_then(|v| v.as_str())
        .unwrap_or("all");
    if allowed.contains(&raw) {
        Ok(raw.to_string())
    } else {
        Err(HandlerErr {
            code: "bad_params",
            message: format!("filter must be one of {}", allowed.join(", ")),
        })
    }
}

fn assignment_common_json(a: &Assignment, today: chrono::NaiveDate) -> serde_json::Value {
    json!({
        "id": a.id,
        "title": a.title,
        "description": a.description,
        "dueDate": a.due_date,
        "driveLink": a.drive_link,
        "daysRemaining": assignments::days_remaining(&a.due_date, today),
    })
}

fn student_dashboard(
    store: &RecordStore,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let filter = get_filter(params, &["all", "pending", "submitted"])?;

    let visible = assignments::visible_to(store, &student_id).map_err(storage_err)?;
    let today = assignments::today();

    let submitted_total = visible
        .iter()
        .filter(|a| a.submission_for(&student_id).map(|s| s.submitted) == Some(true))
        .count();

    let cards: Vec<serde_json::Value> = visible
        .iter()
        .filter(|a| {
            let submitted =
                a.submission_for(&student_id).map(|s| s.submitted) == Some(true);
            match filter.as_str() {
                "submitted" => submitted,
                "pending" => !submitted,
                _ => true,
            }
        })
        .map(|a| {
            let slot = a.submission_for(&student_id);
            let submitted = slot.map(|s| s.submitted).unwrap_or(false);
            let mut card = assignment_common_json(a, today);
            card["submitted"] = json!(submitted);
            card["submittedAt"] = json!(slot.and_then(|s| s.submitted_at.clone()));
            card["status"] = json!(if submitted { "submitted" } else { "pending" });
            card
        })
        .collect();

    Ok(json!({
        "stats": {
            "total": visible.len(),
            "submitted": submitted_total,
            "pending": visible.len() - submitted_total,
        },
        "filter": filter,
        "assignments": cards,
    }))
}

fn admin_dashboard(
    store: &RecordStore,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let admin_id = get_required_str(params, "adminId")?;
    let filter = get_filter(params, &["all", "pending", "completed"])?;

    let mine = assignments::created_by(store, &admin_id).map_err(storage_err)?;
    let students = store.students().map_err(storage_err)?;
    let today = assignments::today();

    let total_submissions: usize = mine.iter().map(assignments::submitted_count).sum();
    let possible = mine.len() * students.len();

    // "Completed" compares against the size of today's roster, not the
    // snapshot length.
    let cards: Vec<serde_json::Value> = mine
        .iter()
        .filter(|a| {
            let submitted = assignments::submitted_count(a);
            match filter.as_str() {
                "completed" => submitted == students.len(),
                "pending" => submitted < students.len(),
                _ => true,
            }
        })
        .map(|a| {
            let submitted = assignments::submitted_count(a);
            let rows: Vec<serde_json::Value> = a
                .submissions
                .iter()
                .map(|s| {
                    let name = lookup_name(&students, &s.student_id);
                    json!({
                        "studentId": s.student_id,
                        "name": name,
                        "submitted": s.submitted,
                        "submittedAt": s.submitted_at,
                    })
                })
                .collect();

            let mut card = assignment_common_json(a, today);
            card["submittedCount"] = json!(submitted);
            card["totalStudents"] = json!(students.len());
            card["submissionRate"] =
                json!(assignments::submission_rate(submitted, students.len()));
            card["submissions"] = json!(rows);
            card
        })
        .collect();

    Ok(json!({
        "stats": {
            "totalAssignments": mine.len(),
            "totalSubmissions": total_submissions,
            "submissionRate": assignments::submission_rate(total_submissions, possible),
            "totalStudents": students.len(),
        },
        "filter": filter,
        "assignments": cards,
    }))
}

fn lookup_name<'a>(students: &'a [User], student_id: &str) -> Option<&'a str> {
    students
        .iter()
        .find(|u| u.id == student_id)
        .map(|u| u.name.as_str())
}

fn handle_dashboard_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match student_dashboard(&ws.store, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_dashboard_admin(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match admin_dashboard(&ws.store, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.student" => Some(handle_dashboard_student(state, req)),
        "dashboard.admin" => Some(handle_dashboard_admin(state, req)),
        _ => None,
    }
}
