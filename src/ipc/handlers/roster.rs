use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_roster_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match ws.store.students() {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => err(&req.id, "storage_read_failed", format!("{e:?}"), None),
    }
}

fn handle_roster_admins(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match ws.store.admins() {
        Ok(admins) => ok(&req.id, json!({ "admins": admins })),
        Err(e) => err(&req.id, "storage_read_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.students" => Some(handle_roster_students(state, req)),
        "roster.admins" => Some(handle_roster_admins(state, req)),
        _ => None,
    }
}
