use std::path::PathBuf;

use serde::Deserialize;

use crate::confirm::SubmissionConfirm;
use crate::session::Session;
use crate::store::RecordStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything tied to the selected workspace: the record store, the identity
/// session, and at most one in-flight submission confirmation.
pub struct OpenWorkspace {
    pub store: RecordStore,
    pub session: Session,
    pub pending_confirm: Option<SubmissionConfirm>,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub open: Option<OpenWorkspace>,
}
