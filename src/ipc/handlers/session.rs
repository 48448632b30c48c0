use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::session::SessionError;
use serde_json::json;

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {}", key))
}

fn get_role(params: &serde_json::Value) -> Result<Role, String> {
    let raw = get_required_str(params, "role")?;
    Role::parse(&raw).ok_or_else(|| format!("role must be student or admin, got {}", raw))
}

/// Minimal `local@domain.tld` shape check. Anything stricter is the UI's
/// problem; the service itself only enforces uniqueness.
fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn handle_session_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(
        &req.id,
        json!({
            "currentUser": ws.session.current(),
            "role": ws.session.role(),
        }),
    )
}

fn handle_session_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let user_id = match get_required_str(&req.params, "userId") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let role = match get_role(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    match ws.session.login(&mut ws.store, &user_id, role) {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(SessionError::NotFound { .. }) => err(
            &req.id,
            "not_found",
            "no matching user for that role",
            Some(json!({ "userId": user_id, "role": role.as_str() })),
        ),
        Err(e) => err(&req.id, "storage_write_failed", format!("{e:?}"), None),
    }
}

fn handle_session_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = match get_required_str(&req.params, "name") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    let email = match get_required_str(&req.params, "email") {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    if !looks_like_email(&email) {
        return err(&req.id, "bad_params", "email must look like local@domain.tld", None);
    }
    let role = match get_role(&req.params) {
        Ok(v) => v,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };

    match ws.session.register(&mut ws.store, &name, &email, role) {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(SessionError::DuplicateEmail(email)) => err(
            &req.id,
            "duplicate_email",
            "email is already registered",
            Some(json!({ "email": email })),
        ),
        Err(e) => err(&req.id, "storage_write_failed", format!("{e:?}"), None),
    }
}

fn handle_session_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.open.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match ws.session.logout(&mut ws.store) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "storage_write_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.current" => Some(handle_session_current(state, req)),
        "session.login" => Some(handle_session_login(state, req)),
        "session.register" => Some(handle_session_register(state, req)),
        "session.logout" => Some(handle_session_logout(state, req)),
        _ => None,
    }
}
