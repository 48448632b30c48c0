use crate::assignments;
use crate::confirm::{ConfirmStep, SubmissionConfirm};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {}", key))
}

fn handle_list_by_admin(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let admin_id = match get_required_str(&req.params, "adminId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match assignments::created_by(&ws.store, &admin_id) {
        Ok(list) => ok(&req.id, json!({ "assignments": list })),
        Err(e) => err(&req.id, "storage_read_failed", format!("{e:?}"), None),
    }
}

fn handle_list_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = match get_required_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match assignments::visible_to(&ws.store, &student_id) {
        Ok(list) => ok(&req.id, json!({ "assignments": list })),
        Err(e) => err(&req.id, "storage_read_failed", format!("{e:?}"), None),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    // Field presence is checked here at the calling boundary; the service
    // itself does not re-validate.
    let admin_id = match get_required_str(&req.params, "adminId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let title = match get_required_str(&req.params, "title") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let description = match get_required_str(&req.params, "description") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let due_date = match get_required_str(&req.params, "dueDate") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let drive_link = match get_required_str(&req.params, "driveLink") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    let input = assignments::NewAssignment {
        title,
        description,
        due_date,
        drive_link,
    };
    match assignments::create(&mut ws.store, &admin_id, input) {
        Ok(created) => ok(&req.id, json!({ "assignment": created })),
        Err(e) => err(&req.id, "storage_write_failed", format!("{e:?}"), None),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let assignment_id = match get_required_str(&req.params, "assignmentId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    // Unknown ids succeed silently.
    match assignments::delete(&mut ws.store, &assignment_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "storage_write_failed", format!("{e:?}"), None),
    }
}

fn handle_set_submission(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let assignment_id = match get_required_str(&req.params, "assignmentId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let student_id = match get_required_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let Some(submitted) = req.params.get("submitted").and_then(|v| v.as_bool()) else {
        return err(&req.id, "bad_params", "missing submitted", None);
    };

    match assignments::set_submission_status(&mut ws.store, &assignment_id, &student_id, submitted)
    {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "storage_write_failed", format!("{e:?}"), None),
    }
}

fn handle_submission_begin(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let assignment_id = match get_required_str(&req.params, "assignmentId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let student_id = match get_required_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    // Opening a new confirmation replaces any abandoned one.
    let flow = SubmissionConfirm::begin(&assignment_id, &student_id);
    let step = flow.step();
    ws.pending_confirm = Some(flow);
    ok(
        &req.id,
        json!({ "step": step, "assignmentId": assignment_id, "studentId": student_id }),
    )
}

fn handle_submission_confirm(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(flow) = ws.pending_confirm.as_mut() else {
        return err(&req.id, "not_found", "no submission confirmation in progress", None);
    };

    let step = flow.confirm();
    let assignment_id = flow.assignment_id.clone();
    let student_id = flow.student_id.clone();

    // Only the transition into Confirmed touches the record store.
    if step == ConfirmStep::Confirmed {
        ws.pending_confirm = None;
        if let Err(e) =
            assignments::set_submission_status(&mut ws.store, &assignment_id, &student_id, true)
        {
            return err(&req.id, "storage_write_failed", format!("{e:?}"), None);
        }
    }

    ok(
        &req.id,
        json!({ "step": step, "assignmentId": assignment_id, "studentId": student_id }),
    )
}

fn handle_submission_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(flow) = ws.pending_confirm.as_mut() else {
        return err(&req.id, "not_found", "no submission confirmation in progress", None);
    };

    let step = flow.cancel();
    let assignment_id = flow.assignment_id.clone();
    let student_id = flow.student_id.clone();
    if !flow.is_open() {
        ws.pending_confirm = None;
    }

    ok(
        &req.id,
        json!({ "step": step, "assignmentId": assignment_id, "studentId": student_id }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.listByAdmin" => Some(handle_list_by_admin(state, req)),
        "assignments.listForStudent" => Some(handle_list_for_student(state, req)),
        "assignments.create" => Some(handle_create(state, req)),
        "assignments.delete" => Some(handle_delete(state, req)),
        "assignments.setSubmission" => Some(handle_set_submission(state, req)),
        "submission.begin" => Some(handle_submission_begin(state, req)),
        "submission.confirm" => Some(handle_submission_confirm(state, req)),
        "submission.cancel" => Some(handle_submission_cancel(state, req)),
        _ => None,
    }
}
