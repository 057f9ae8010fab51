use serde_json::json;
use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

struct Sidecar {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Sidecar {
    fn spawn() -> Self {
        let exe = env!("CARGO_BIN_EXE_seatingd");
        let mut child = Command::new(exe)
            .env("SEATINGD_CONFIG", "/nonexistent/seatingd.toml")
            .env("SEATINGD_DEFAULT_ROWS", "2")
            .env("SEATINGD_DEFAULT_COLS", "2")
            .env_remove("SEATINGD_OCCUPIED_SEAT_POLICY")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn seatingd");
        let stdin = child.stdin.take().expect("child stdin");
        let stdout = child.stdout.take().expect("child stdout");
        Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            next_id: 0,
        }
    }

    fn request(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({ "id": id, "method": method, "params": params });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    fn ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let resp = self.request(method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
        resp["result"].clone()
    }

    fn error_code(&mut self, method: &str, params: serde_json::Value) -> (String, serde_json::Value) {
        let resp = self.request(method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            resp
        );
        let code = resp["error"]["code"].as_str().unwrap_or("").to_string();
        (code, resp["error"].clone())
    }

    fn raw_line(&mut self, line: &str) -> serde_json::Value {
        writeln!(self.stdin, "{}", line).expect("write raw line");
        self.stdin.flush().expect("flush raw line");
        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    fn open_session(&mut self) -> String {
        self.ok("session.open", json!({}))["sessionId"]
            .as_str()
            .expect("sessionId")
            .to_string()
    }

    fn finish(mut self) {
        drop(self.stdin);
        let _ = self.child.wait();
    }
}

fn assignments(list: &serde_json::Value) -> Vec<(String, String)> {
    list["assignments"]
        .as_array()
        .expect("assignments")
        .iter()
        .map(|a| {
            (
                a["seat"].as_str().expect("seat").to_string(),
                a["student"].as_str().expect("student").to_string(),
            )
        })
        .collect()
}

#[test]
fn three_students_on_a_two_by_two_grid() {
    let mut sc = Sidecar::spawn();
    let sid = sc.open_session();

    sc.ok(
        "roster.import",
        json!({ "sessionId": sid, "names": ["Alice", "Bob", "Carol"] }),
    );
    let randomized = sc.ok("seats.randomizeAll", json!({ "sessionId": sid }));
    assert_eq!(randomized["assigned"], 3);
    assert_eq!(randomized["unassigned"], json!([]));

    let list = sc.ok("seats.list", json!({ "sessionId": sid }));
    let seated = assignments(&list);
    assert_eq!(seated.len(), 3);
    let seats: HashSet<&str> = seated.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(seats.len(), 3);
    assert!(seats.is_subset(&["A1", "A2", "B1", "B2"].into_iter().collect()));
    assert_eq!(list["summary"]["emptySeats"], 1);

    let alice_seat = seated
        .iter()
        .find(|(_, n)| n == "Alice")
        .map(|(s, _)| s.clone())
        .expect("alice seated");
    let (code, error) = sc.error_code(
        "seats.assign",
        json!({ "sessionId": sid, "student": "Alice", "seat": "A1" }),
    );
    assert_eq!(code, "already_seated");
    assert_eq!(error["details"]["seat"], alice_seat.as_str());

    let bob_seat = seated
        .iter()
        .find(|(_, n)| n == "Bob")
        .map(|(s, _)| s.clone())
        .expect("bob seated");
    let removed = sc.ok("seats.remove", json!({ "sessionId": sid, "student": "Bob" }));
    assert_eq!(removed["removed"], 1);
    let after = assignments(&sc.ok("seats.list", json!({ "sessionId": sid })));
    assert!(after.iter().all(|(s, _)| *s != bob_seat));
    assert_eq!(after.len(), 2);

    sc.finish();
}

#[test]
fn manual_assignment_displaces_previous_occupant() {
    let mut sc = Sidecar::spawn();
    let sid = sc.open_session();
    sc.ok(
        "roster.importText",
        json!({ "sessionId": sid, "text": "Alice\n\n  Bob  \nCarol\n" }),
    );

    sc.ok(
        "seats.assign",
        json!({ "sessionId": sid, "student": "Alice", "seat": "b2" }),
    );
    let placed = sc.ok(
        "seats.assign",
        json!({ "sessionId": sid, "student": "Bob", "seat": "B2" }),
    );
    assert_eq!(placed["seat"], "B2");
    assert_eq!(placed["displaced"], "Alice");

    let roster = sc.ok("roster.list", json!({ "sessionId": sid }));
    assert_eq!(roster["total"], 3);
    assert_eq!(roster["unassigned"], json!(["Alice", "Carol"]));
    assert_eq!(roster["students"][1], json!({ "name": "Bob", "seat": "B2" }));

    let (code, _) = sc.error_code(
        "seats.assign",
        json!({ "sessionId": sid, "student": "Carol", "seat": "K1" }),
    );
    assert_eq!(code, "bad_seat");

    sc.finish();
}

#[test]
fn randomize_one_fills_the_last_seat_then_reports_full_grid() {
    let mut sc = Sidecar::spawn();
    let sid = sc.open_session();
    sc.ok(
        "roster.import",
        json!({ "sessionId": sid, "names": ["A", "B", "C", "D", "E"] }),
    );
    for (student, seat) in [("A", "A1"), ("B", "A2"), ("C", "B1")] {
        sc.ok(
            "seats.assign",
            json!({ "sessionId": sid, "student": student, "seat": seat }),
        );
    }

    let picked = sc.ok(
        "seats.randomizeOne",
        json!({ "sessionId": sid, "student": "D" }),
    );
    assert_eq!(picked["seat"], "B2");

    let (code, _) = sc.error_code(
        "seats.randomizeOne",
        json!({ "sessionId": sid, "student": "E" }),
    );
    assert_eq!(code, "no_empty_seats");
    assert_eq!(
        assignments(&sc.ok("seats.list", json!({ "sessionId": sid }))).len(),
        4
    );

    sc.finish();
}

#[test]
fn empty_state_errors_do_not_mutate() {
    let mut sc = Sidecar::spawn();
    let sid = sc.open_session();

    let (code, _) = sc.error_code("seats.randomizeAll", json!({ "sessionId": sid }));
    assert_eq!(code, "empty_roster");
    let (code, _) = sc.error_code(
        "seats.randomizeOne",
        json!({ "sessionId": sid, "student": "Alice" }),
    );
    assert_eq!(code, "empty_roster");
    let (code, _) = sc.error_code("export.xlsx", json!({ "sessionId": sid }));
    assert_eq!(code, "empty_assignment");

    let (code, _) = sc.error_code("seats.list", json!({ "sessionId": "nope" }));
    assert_eq!(code, "unknown_session");
    let (code, _) = sc.error_code("seats.fly", json!({ "sessionId": sid }));
    assert_eq!(code, "not_implemented");
    let (code, _) = sc.error_code("seats.assign", json!({ "sessionId": sid, "seat": "A1" }));
    assert_eq!(code, "bad_params");

    let bad = sc.raw_line("{not json");
    assert_eq!(bad["ok"], false);
    assert_eq!(bad["error"]["code"], "bad_json");
    // The loop keeps serving after a bad line.
    assert_eq!(sc.ok("health", json!({}))["sessions"], 1);

    sc.finish();
}

#[test]
fn layout_shrink_keeps_orphaned_seats() {
    let mut sc = Sidecar::spawn();
    let sid = sc.open_session();
    sc.ok("roster.loadExample", json!({ "sessionId": sid }));
    sc.ok(
        "layout.update",
        json!({ "sessionId": sid, "rows": 4, "cols": 6 }),
    );
    let randomized = sc.ok("seats.randomizeAll", json!({ "sessionId": sid }));
    assert_eq!(randomized["assigned"], 22);
    assert_eq!(randomized["unassigned"], json!([]));

    let shrunk = sc.ok(
        "layout.update",
        json!({ "sessionId": sid, "rows": 2, "cols": 3 }),
    );
    let orphans = shrunk["orphanedSeats"].as_array().expect("orphans").len();
    assert!(orphans >= 16, "at most 6 of 22 fit a 2x3 grid, got {} orphans", orphans);

    let list = sc.ok("seats.list", json!({ "sessionId": sid }));
    assert_eq!(assignments(&list).len(), 22);
    let in_grid = list["summary"]["occupiedSeats"].as_u64().expect("occupied") as usize;
    assert_eq!(in_grid + orphans, 22);
    assert_eq!(list["grid"].as_array().expect("grid").len(), 2);

    let (code, _) = sc.error_code(
        "layout.update",
        json!({ "sessionId": sid, "rows": 11, "cols": 3 }),
    );
    assert_eq!(code, "bad_layout");

    let cleared = sc.ok("seats.clear", json!({ "sessionId": sid }));
    assert_eq!(cleared["cleared"], 22);

    sc.finish();
}

#[test]
fn sessions_are_isolated() {
    let mut sc = Sidecar::spawn();
    let first = sc.open_session();
    let second = sc.open_session();
    assert_ne!(first, second);

    sc.ok(
        "roster.import",
        json!({ "sessionId": first, "names": ["Alice", "Alice", "Bob"], "dedupe": true }),
    );
    let roster = sc.ok("roster.list", json!({ "sessionId": first }));
    assert_eq!(roster["total"], 2);
    let other = sc.ok("roster.list", json!({ "sessionId": second }));
    assert_eq!(other["total"], 0);

    sc.ok("session.close", json!({ "sessionId": first }));
    let (code, _) = sc.error_code("roster.list", json!({ "sessionId": first }));
    assert_eq!(code, "unknown_session");
    let health = sc.ok("health", json!({}));
    assert_eq!(health["sessions"], 1);

    sc.finish();
}
