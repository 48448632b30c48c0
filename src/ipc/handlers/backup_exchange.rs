use crate::assignments;
use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, OpenWorkspace, Request};
use crate::session::Session;
use crate::store::{open_storage, RecordStore};
use serde_json::json;
use std::path::PathBuf;

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn handle_backup_export_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match req.params.get("outPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing outPath", None),
    };
    let workspace_path = req
        .params
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .or_else(|| state.workspace.clone());
    let Some(workspace_path) = workspace_path else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let out = PathBuf::from(&out_path);
    let export = match backup::export_workspace_bundle(&workspace_path, &out) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": out_path })),
            )
        }
    };

    ok(
        &req.id,
        json!({
            "ok": true,
            "path": out_path,
            "bundleFormat": export.bundle_format,
            "entryCount": export.entry_count,
            "dbSha256": export.db_sha256
        }),
    )
}

fn handle_backup_import_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match req.params.get("inPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing inPath", None),
    };
    let workspace_path = req
        .params
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .or_else(|| state.workspace.clone());
    let Some(workspace_path) = workspace_path else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": in_path })),
        );
    }

    // Drop the open handle before replacing the store file.
    state.open = None;

    let import = match backup::import_workspace_bundle(&src, &workspace_path) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": src.to_string_lossy() })),
            )
        }
    };

    let storage = match open_storage(&workspace_path) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "storage_open_failed", format!("{e:?}"), None),
    };
    let store = RecordStore::new(Box::new(storage));
    let mut session = Session::default();
    let restored = match session.restore(&store) {
        Ok(user) => user,
        Err(e) => return err(&req.id, "storage_read_failed", format!("{e:?}"), None),
    };

    state.workspace = Some(workspace_path.clone());
    state.open = Some(OpenWorkspace {
        store,
        session,
        pending_confirm: None,
    });

    ok(
        &req.id,
        json!({
            "ok": true,
            "workspacePath": workspace_path.to_string_lossy(),
            "bundleFormatDetected": import.bundle_format_detected,
            "currentUser": restored
        }),
    )
}

/// One CSV row per (assignment, submission slot) for everything the admin
/// created, in storage order.
fn handle_exchange_export_submissions_csv(
    state: &mut AppState,
    req: &Request,
) -> serde_json::Value {
    let Some(ws) = state.open.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let admin_id = match req.params.get("adminId").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => return err(&req.id, "bad_params", "missing adminId", None),
    };
    let out_path = match req.params.get("outPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing outPath", None),
    };

    let mine = match assignments::created_by(&ws.store, &admin_id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "storage_read_failed", format!("{e:?}"), None),
    };
    let students = match ws.store.students() {
        Ok(v) => v,
        Err(e) => return err(&req.id, "storage_read_failed", format!("{e:?}"), None),
    };

    let mut csv = String::from(
        "assignment_id,assignment_title,due_date,student_id,student_name,submitted,submitted_at\n",
    );
    let mut rows_exported = 0usize;
    for assignment in &mine {
        for slot in &assignment.submissions {
            let name = students
                .iter()
                .find(|u| u.id == slot.student_id)
                .map(|u| u.name.as_str())
                .unwrap_or("");
            csv.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                csv_quote(&assignment.id),
                csv_quote(&assignment.title),
                csv_quote(&assignment.due_date),
                csv_quote(&slot.student_id),
                csv_quote(name),
                slot.submitted,
                slot.submitted_at.as_deref().unwrap_or_default()
            ));
            rows_exported += 1;
        }
    }

    let out = PathBuf::from(&out_path);
    if let Some(parent) = out.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": out_path })),
            );
        }
    }
    if let Err(e) = std::fs::write(&out, csv) {
        return err(
            &req.id,
            "io_failed",
            e.to_string(),
            Some(json!({ "path": out_path })),
        );
    }

    ok(
        &req.id,
        json!({ "ok": true, "rowsExported": rows_exported, "path": out_path }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_backup_export_workspace_bundle(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_backup_import_workspace_bundle(state, req)),
        "exchange.exportSubmissionsCsv" => Some(handle_exchange_export_submissions_csv(state, req)),
        _ => None,
    }
}
