use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_joineazyd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn joineazyd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn bundle_roundtrip_carries_mutations_into_a_fresh_workspace() {
    let source = temp_dir("joineazy-backup-source");
    let target = temp_dir("joineazy-backup-target");
    let bundle = source.join("backup.jezbackup.zip");

    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": source.to_string_lossy() }),
    );

    // Mutate past the seed so the roundtrip has something to prove.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.setSubmission",
        json!({ "assignmentId": "assign2", "studentId": "s1", "submitted": true }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.login",
        json!({ "userId": "s1", "role": "student" }),
    );

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.exportWorkspaceBundle",
        json!({
            "workspacePath": source.to_string_lossy(),
            "outPath": bundle.to_string_lossy()
        }),
    );
    assert_eq!(
        exported.get("bundleFormat").and_then(|v| v.as_str()),
        Some("joineazy-workspace-v1")
    );
    assert!(exported
        .get("dbSha256")
        .and_then(|v| v.as_str())
        .map(|s| s.len() == 64)
        .unwrap_or(false));

    // Import into a different directory; the handler reopens the target and
    // restores the identity that was logged in at export time.
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "backup.importWorkspaceBundle",
        json!({
            "workspacePath": target.to_string_lossy(),
            "inPath": bundle.to_string_lossy()
        }),
    );
    assert_eq!(
        imported
            .pointer("/currentUser/id")
            .and_then(|v| v.as_str()),
        Some("s1")
    );

    let dash = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "dashboard.admin",
        json!({ "adminId": "a1" }),
    );
    // Seeded 5 plus the extra submission made before export.
    assert_eq!(
        dash.pointer("/stats/totalSubmissions").and_then(|v| v.as_u64()),
        Some(6)
    );

    drop(stdin);
    let _ = std::fs::remove_dir_all(source);
    let _ = std::fs::remove_dir_all(target);
}

#[test]
fn import_rejects_files_that_are_not_bundles() {
    let workspace = temp_dir("joineazy-backup-reject");
    let garbage = workspace.join("not-a-bundle.zip");
    std::fs::write(&garbage, b"this is not a zip archive").expect("write garbage");

    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let rejected = request(
        &mut stdin,
        &mut reader,
        "2",
        "backup.importWorkspaceBundle",
        json!({
            "workspacePath": workspace.to_string_lossy(),
            "inPath": garbage.to_string_lossy()
        }),
    );
    assert_eq!(rejected.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        rejected.pointer("/error/code").and_then(|v| v.as_str()),
        Some("io_failed")
    );

    // The workspace store is intact; selecting it again still sees the seed.
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert!(selected
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .is_some());
    let dash = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dashboard.admin",
        json!({ "adminId": "a1" }),
    );
    assert_eq!(
        dash.pointer("/stats/totalSubmissions").and_then(|v| v.as_u64()),
        Some(5)
    );

    drop(stdin);
    let _ = std::fs::remove_dir_all(workspace);
}
