use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::{Assignment, Submission};
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub drive_link: String,
}

pub fn created_by(store: &RecordStore, admin_id: &str) -> anyhow::Result<Vec<Assignment>> {
    let all = store.assignments()?;
    Ok(all.into_iter().filter(|a| a.created_by == admin_id).collect())
}

/// Assignments that carry a submission slot for the student, i.e. the ones
/// that existed while the student was on the roster. Students registered
/// later never gain a slot retroactively.
pub fn visible_to(store: &RecordStore, student_id: &str) -> anyhow::Result<Vec<Assignment>> {
    let all = store.assignments()?;
    Ok(all
        .into_iter()
        .filter(|a| a.submission_for(student_id).is_some())
        .collect())
}

/// Creates an assignment with an unsubmitted slot per student currently on
/// the roster (snapshot semantics) and persists the full collection.
pub fn create(
    store: &mut RecordStore,
    admin_id: &str,
    input: NewAssignment,
) -> anyhow::Result<Assignment> {
    let submissions: Vec<Submission> = store
        .students()?
        .iter()
        .map(|student| Submission {
            student_id: student.id.clone(),
            submitted: false,
            submitted_at: None,
        })
        .collect();

    let assignment = Assignment {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        description: input.description,
        due_date: input.due_date,
        drive_link: input.drive_link,
        created_by: admin_id.to_string(),
        created_at: today().to_string(),
        submissions,
    };

    let mut all = store.assignments()?;
    all.push(assignment.clone());
    store.save_assignments(&all)?;
    tracing::info!(
        assignment_id = %assignment.id,
        created_by = admin_id,
        slots = assignment.submissions.len(),
        "created assignment"
    );
    Ok(assignment)
}

/// Hard delete. An unknown id is a silent success, not an error.
pub fn delete(store: &mut RecordStore, assignment_id: &str) -> anyhow::Result<()> {
    let mut all = store.assignments()?;
    let before = all.len();
    all.retain(|a| a.id != assignment_id);
    if all.len() < before {
        tracing::info!(assignment_id, "deleted assignment");
    }
    store.save_assignments(&all)
}

/// Sets a student's submission flag. Marking submitted stamps `submittedAt`
/// with today's date; unmarking clears it (the undo direction is not wired
/// to any UI but is part of the operation's contract). Unknown assignment or
/// missing slot is a silent no-op.
pub fn set_submission_status(
    store: &mut RecordStore,
    assignment_id: &str,
    student_id: &str,
    submitted: bool,
) -> anyhow::Result<()> {
    let mut all = store.assignments()?;
    let Some(assignment) = all.iter_mut().find(|a| a.id == assignment_id) else {
        return Ok(());
    };

    if let Some(slot) = assignment
        .submissions
        .iter_mut()
        .find(|s| s.student_id == student_id)
    {
        slot.submitted = submitted;
        slot.submitted_at = submitted.then(|| today().to_string());
        tracing::info!(assignment_id, student_id, submitted, "updated submission");
    }
    store.save_assignments(&all)
}

pub fn submitted_count(assignment: &Assignment) -> usize {
    assignment.submissions.iter().filter(|s| s.submitted).count()
}

/// Percentage rounded to the nearest integer, defined as 0 when the
/// denominator is 0.
pub fn submission_rate(submitted: usize, possible: usize) -> u32 {
    if possible == 0 {
        return 0;
    }
    ((submitted as f64 / possible as f64) * 100.0).round() as u32
}

/// Whole days until the due date; negative when overdue, None when the
/// stored date does not parse.
pub fn days_remaining(due_date: &str, today: NaiveDate) -> Option<i64> {
    let due = NaiveDate::parse_from_str(due_date, "%Y-%m-%d").ok()?;
    Some((due - today).num_days())
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
