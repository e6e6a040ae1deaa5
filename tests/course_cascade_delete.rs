use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_workspace(prefix: &str) -> PathBuf {
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
    let exe = env!("CARGO_BIN_EXE_courseadmind");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn courseadmind");
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

fn request_err_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert!(
        !value.get("ok").and_then(|v| v.as_bool()).unwrap_or(true),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value["error"]["code"]
        .as_str()
        .expect("error code")
        .to_string()
}

#[test]
fn delete_of_missing_course_is_not_found() {
    let workspace = temp_workspace("courseadmin-delete-missing");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "2",
        "courses.delete",
        json!({ "courseId": "ghost" }),
    );
    assert_eq!(code, "not_found");
}

#[test]
fn cascade_removes_videos_links_and_the_course() {
    let workspace = temp_workspace("courseadmin-cascade");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let course = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.create",
        json!({ "title": "Intro" }),
    );
    let course_id = course["course"]["id"].as_str().unwrap().to_string();
    let p1 = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "packages.create",
        json!({ "title": "Starter", "price": 19.0 }),
    );
    let p1_id = p1["package"]["id"].as_str().unwrap().to_string();
    let p2 = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "packages.create",
        json!({ "title": "Complete", "price": 99.0 }),
    );
    let p2_id = p2["package"]["id"].as_str().unwrap().to_string();
    request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "packages.linkCourse",
        json!({ "packageId": p1_id, "courseId": course_id }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "packages.linkCourse",
        json!({ "packageId": p2_id, "courseId": course_id }),
    );
    for n in 0..3 {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("7-{n}"),
            "videos.create",
            json!({ "courseId": course_id, "title": format!("Lesson {n}") }),
        );
    }

    let deps = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "courses.dependencies",
        json!({ "courseId": course_id }),
    );
    assert_eq!(deps["videos"], json!(3));
    assert_eq!(deps["packages"], json!(2));
    assert_eq!(deps["packageNames"], json!(["Complete", "Starter"]));

    request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "courses.delete",
        json!({ "courseId": course_id }),
    );

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "10",
        "courses.get",
        json!({ "courseId": course_id }),
    );
    assert_eq!(code, "not_found");

    for (id, pkg) in [("11", &p1_id), ("12", &p2_id)] {
        let result = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "packages.courses",
            json!({ "packageId": pkg }),
        );
        assert!(result["courses"].as_array().unwrap().is_empty());
    }

    let audit = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "audit.videoRelationships",
        json!({}),
    );
    assert_eq!(audit["totalVideos"], json!(0));
}

#[test]
fn delete_works_with_no_dependents_at_all() {
    let workspace = temp_workspace("courseadmin-cascade-empty");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let course = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.create",
        json!({ "title": "Loner" }),
    );
    let course_id = course["course"]["id"].as_str().unwrap().to_string();

    let deps = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "courses.dependencies",
        json!({ "courseId": course_id }),
    );
    assert_eq!(deps["videos"], json!(0));
    assert_eq!(deps["packages"], json!(0));
    assert_eq!(deps["packageNames"], json!([]));

    request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "courses.delete",
        json!({ "courseId": course_id }),
    );
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "5",
        "courses.get",
        json!({ "courseId": course_id }),
    );
    assert_eq!(code, "not_found");
}

// The front end's happy path, end to end: create a course, attach a lesson,
// confirm via the dependency prompt, delete, verify everything is gone.
#[test]
fn course_lifecycle_scenario() {
    let workspace = temp_workspace("courseadmin-scenario");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let course = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "courses.create",
        json!({ "title": "Intro" }),
    );
    let course_id = course["course"]["id"].as_str().unwrap().to_string();

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "videos.create",
        json!({ "courseId": course_id, "title": "Lesson 1" }),
    );

    let deps = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "courses.dependencies",
        json!({ "courseId": course_id }),
    );
    assert_eq!(deps["videos"], json!(1));
    assert_eq!(deps["packages"], json!(0));
    assert_eq!(deps["packageNames"], json!([]));

    request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "courses.delete",
        json!({ "courseId": course_id }),
    );

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "6",
        "courses.get",
        json!({ "courseId": course_id }),
    );
    assert_eq!(code, "not_found");
    let audit = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "audit.videoRelationships",
        json!({}),
    );
    assert_eq!(audit["totalVideos"], json!(0));
    assert_eq!(audit["orphanedVideos"], json!([]));
}
