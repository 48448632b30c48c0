use serde::Serialize;

/// Two-step submission confirmation, modeled as an explicit state machine
/// instead of a step counter. The status change is applied only by the
/// transition into `Confirmed`; `Closed` means dismissed without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmStep {
    Initial,
    ConfirmPending,
    Confirmed,
    Closed,
}

#[derive(Debug)]
pub struct SubmissionConfirm {
    pub assignment_id: String,
    pub student_id: String,
    step: ConfirmStep,
}

impl SubmissionConfirm {
    pub fn begin(assignment_id: &str, student_id: &str) -> Self {
        SubmissionConfirm {
            assignment_id: assignment_id.to_string(),
            student_id: student_id.to_string(),
            step: ConfirmStep::Initial,
        }
    }

    pub fn step(&self) -> ConfirmStep {
        self.step
    }

    /// "Yes" on the first prompt asks for final confirmation; "yes" on the
    /// final prompt confirms. Terminal states absorb further confirms.
    pub fn confirm(&mut self) -> ConfirmStep {
        self.step = match self.step {
            ConfirmStep::Initial => ConfirmStep::ConfirmPending,
            ConfirmStep::ConfirmPending => ConfirmStep::Confirmed,
            done => done,
        };
        self.step
    }

    /// "Go back" from the final prompt returns to the first; cancelling the
    /// first prompt closes the flow.
    pub fn cancel(&mut self) -> ConfirmStep {
        self.step = match self.step {
            ConfirmStep::ConfirmPending => ConfirmStep::Initial,
            ConfirmStep::Initial => ConfirmStep::Closed,
            done => done,
        };
        self.step
    }

    pub fn is_open(&self) -> bool {
        matches!(self.step, ConfirmStep::Initial | ConfirmStep::ConfirmPending)
    }
}
