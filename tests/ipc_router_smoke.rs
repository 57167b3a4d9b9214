use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("SCHOOLD_CONFIG")
        .spawn()
        .expect("spawn schoold");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn send(
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

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = send(stdin, reader, id, method, params);
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], json!(true));
    assert!(health["result"]["version"].is_string());
    assert!(health["result"]["userCount"].is_null());

    let actor = json!({ "id": "a1", "role": "admin" });
    for (id, method, params) in [
        ("2", "directory.load", json!({ "users": [] })),
        ("3", "actor.resolve", json!({ "actor": actor })),
        (
            "4",
            "policy.check",
            json!({ "actor": actor, "operation": "read", "resource": { "kind": "classRoster", "classId": "5A" } }),
        ),
        (
            "5",
            "policy.authorize",
            json!({ "actor": actor, "operation": "read", "resource": { "kind": "classRoster", "classId": "5A" } }),
        ),
        ("6", "policy.scope", json!({ "actor": actor, "kind": "grade" })),
        (
            "7",
            "policy.filter",
            json!({ "actor": actor, "kind": "grade", "resources": [] }),
        ),
        (
            "8",
            "messages.conversations",
            json!({ "actor": actor, "messages": [] }),
        ),
        (
            "9",
            "messages.thread",
            json!({ "actor": actor, "counterpartId": "t1", "messages": [] }),
        ),
        ("10", "messages.unread", json!({ "actor": actor, "messages": [] })),
    ] {
        let resp = request(&mut stdin, &mut reader, id, method, params);
        assert_eq!(resp["ok"], json!(true), "{} failed: {}", method, resp);
    }

    let unknown = send(&mut stdin, &mut reader, "11", "grades.delete", json!({}));
    assert_eq!(unknown["error"]["code"], json!("not_implemented"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bad_json_line_gets_error_and_loop_continues() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let resp = read_response(&mut reader);
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("bad_json"));

    let health = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(health["ok"], json!(true));

    drop(stdin);
    let _ = child.wait();
}
