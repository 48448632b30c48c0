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

fn list_ids(result: &serde_json::Value) -> Vec<String> {
    result
        .get("assignments")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .filter_map(|r| r.get("id").and_then(|v| v.as_str()).map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn create_snapshot_delete_and_silent_noop() {
    let workspace = temp_dir("joineazy-assignment-lifecycle");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Seeded admin starts with the three demo assignments.
    let initial = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.listByAdmin",
        json!({ "adminId": "a1" }),
    );
    assert_eq!(
        list_ids(&initial),
        vec!["assign1", "assign2", "assign3"]
    );

    // A new assignment snapshots one unsubmitted slot per roster student.
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "assignments.create",
        json!({
            "adminId": "a1",
            "title": "Ownership and Borrowing",
            "description": "Work through the borrow checker exercises",
            "dueDate": "2026-02-01",
            "driveLink": "https://drive.google.com/folder/ownership"
        }),
    );
    let assignment = created.get("assignment").cloned().expect("assignment");
    let new_id = assignment
        .get("id")
        .and_then(|v| v.as_str())
        .expect("id")
        .to_string();
    let slots = assignment
        .get("submissions")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("submissions");
    assert_eq!(slots.len(), 3);
    for slot in &slots {
        assert_eq!(slot.get("submitted").and_then(|v| v.as_bool()), Some(false));
        assert!(slot.get("submittedAt").is_none());
    }
    assert!(assignment
        .get("createdAt")
        .and_then(|v| v.as_str())
        .map(|s| !s.is_empty())
        .unwrap_or(false));

    let after_create = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "assignments.listByAdmin",
        json!({ "adminId": "a1" }),
    );
    assert_eq!(list_ids(&after_create).len(), 4);

    // Missing fields are rejected at the boundary.
    let rejected = request(
        &mut stdin,
        &mut reader,
        "5",
        "assignments.create",
        json!({
            "adminId": "a1",
            "title": "   ",
            "description": "no title",
            "dueDate": "2026-02-01",
            "driveLink": "https://drive.google.com/folder/x"
        }),
    );
    assert_eq!(rejected.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        rejected.pointer("/error/code").and_then(|v| v.as_str()),
        Some("bad_params")
    );

    // Delete removes exactly one record.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "assignments.delete",
        json!({ "assignmentId": new_id }),
    );
    let after_delete = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "assignments.listByAdmin",
        json!({ "adminId": "a1" }),
    );
    assert_eq!(
        list_ids(&after_delete),
        vec!["assign1", "assign2", "assign3"]
    );

    // Deleting an unknown id succeeds silently and changes nothing.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "assignments.delete",
        json!({ "assignmentId": "no-such-assignment" }),
    );
    let unchanged = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "assignments.listByAdmin",
        json!({ "adminId": "a1" }),
    );
    assert_eq!(list_ids(&unchanged).len(), 3);

    // Assignments created by someone else never show up in this scope.
    let other = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "assignments.listByAdmin",
        json!({ "adminId": "someone-else" }),
    );
    assert!(list_ids(&other).is_empty());

    drop(stdin);
    let _ = std::fs::remove_dir_all(workspace);
}
