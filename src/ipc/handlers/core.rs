use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, OpenWorkspace, Request};
use crate::session::Session;
use crate::store::{open_storage, RecordStore};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let storage = match open_storage(&path) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "storage_open_failed", format!("{e:?}"), None),
    };

    let mut store = RecordStore::new(Box::new(storage));
    if let Err(e) = store.initialize() {
        return err(&req.id, "storage_write_failed", format!("{e:?}"), None);
    }

    // Restore the persisted identity, if any. The stored value is trusted
    // as-is; see Session::restore.
    let mut session = Session::default();
    let restored = match session.restore(&store) {
        Ok(user) => user,
        Err(e) => return err(&req.id, "storage_read_failed", format!("{e:?}"), None),
    };

    tracing::info!(workspace = %path.to_string_lossy(), "workspace selected");
    state.workspace = Some(path.clone());
    state.open = Some(OpenWorkspace {
        store,
        session,
        pending_confirm: None,
    });

    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "currentUser": restored,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
