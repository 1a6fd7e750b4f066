#![allow(deprecated)]
use assert_cmd::Command;
use chrono::{Duration, Utc};
use pipeline_core::opportunity::{Activity, Opportunity};
use pipeline_core::store::OpportunityStore;
use pipeline_core::types::{ActivityStatus, ForecastStage, PrimaryStage};
use predicates::prelude::*;
use std::io::{BufRead, BufReader};
use std::process::Stdio;
use std::sync::mpsc;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

fn pipeline(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pipeline").unwrap();
    cmd.current_dir(dir.path())
        .env("PIPELINE_ROOT", dir.path())
        .env_remove("PIPELINE_SERVER");
    cmd
}

fn activity(id: &str, days: i64) -> Activity {
    Activity {
        id: id.to_string(),
        activity_type: "Call".to_string(),
        due_date: Some(Utc::now() + Duration::days(days) + Duration::hours(1)),
        note: format!("note {id}"),
        status: ActivityStatus::Pending,
    }
}

/// `pipeline init` plus three records: a (Sourced), b (Qualified), c (Win).
fn seeded() -> (TempDir, OpportunityStore) {
    let dir = TempDir::new().unwrap();
    pipeline(&dir).arg("init").assert().success();
    let store = OpportunityStore::new(dir.path());

    let mut a = Opportunity::new("a", "Navy Modernization");
    a.value = 100.0;
    a.activities = vec![activity("late", -3), activity("soon", 2), activity("far", 40)];
    let mut b = Opportunity::new("b", "VA Claims");
    b.stage = PrimaryStage::Qualified;
    b.forecast_stage = ForecastStage::HighPriority;
    b.value = 250.0;
    b.win_probability = 70;
    let mut c = Opportunity::new("c", "DHS Portal");
    c.stage = PrimaryStage::Win;
    for r in [a, b, c] {
        store.upsert(r).unwrap();
    }
    (dir, store)
}

/// Run `pipeline_server::serve_on` for `dir` on an ephemeral port in the
/// background. The listener is bound before returning, so requests queue
/// until the server picks them up.
fn start_server(dir: &TempDir) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port();
    let root = dir.path().to_path_buf();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            pipeline_server::serve_on(root, listener, false).await
        })
    });
    format!("http://127.0.0.1:{port}")
}

// ---------------------------------------------------------------------------
// pipeline init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_project_files() {
    let dir = TempDir::new().unwrap();
    pipeline(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .pipeline/config.yaml"));

    assert!(dir.path().join(".pipeline").is_dir());
    assert!(dir.path().join(".pipeline/config.yaml").exists());
    assert!(dir.path().join(".pipeline/opportunities.yaml").exists());
}

#[test]
fn init_is_idempotent() {
    let (dir, store) = seeded();
    pipeline(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));
    assert_eq!(store.load_all().unwrap().len(), 3);
}

#[test]
fn board_without_init_fails() {
    let dir = TempDir::new().unwrap();
    pipeline(&dir)
        .arg("board")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

// ---------------------------------------------------------------------------
// pipeline board
// ---------------------------------------------------------------------------

#[test]
fn board_lists_every_stage() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .arg("board")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sourced"))
        .stdout(predicate::str::contains("Nurturing"))
        .stdout(predicate::str::contains("Won"))
        .stdout(predicate::str::contains("Lost"));
}

#[test]
fn forecast_board_json_has_three_columns() {
    let (dir, _store) = seeded();
    let out = pipeline(&dir)
        .args(["board", "forecast", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let columns = json["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0]["records"], serde_json::json!(["a", "c"]));
    assert_eq!(columns[1]["records"], serde_json::json!(["b"]));
    assert_eq!(columns[1]["mean_win_probability"], 70.0);
}

// ---------------------------------------------------------------------------
// pipeline move
// ---------------------------------------------------------------------------

#[test]
fn move_to_stage_persists() {
    let (dir, store) = seeded();
    pipeline(&dir)
        .args(["move", "a", "opp qualified"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved a to Qualified"));
    assert_eq!(store.find("a").unwrap().stage, PrimaryStage::Qualified);
}

#[test]
fn move_on_forecast_board_leaves_primary_alone() {
    let (dir, store) = seeded();
    pipeline(&dir)
        .args(["move", "a", "Low Priority", "--board", "forecast"])
        .assert()
        .success();
    let a = store.find("a").unwrap();
    assert_eq!(a.forecast_stage, ForecastStage::LowPriority);
    assert_eq!(a.stage, PrimaryStage::Sourced);
}

#[test]
fn move_to_current_stage_is_noop() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .args(["move", "b", "opp qualified", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"changed\": false"));
}

#[test]
fn move_to_foreign_stage_fails() {
    let (dir, store) = seeded();
    pipeline(&dir)
        .args(["move", "a", "Win", "--board", "forecast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a forecast stage"));
    assert_eq!(store.find("a").unwrap().forecast_stage, ForecastStage::Source);
}

#[test]
fn move_unknown_record_fails() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .args(["move", "zz", "Win"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("opportunity not found: zz"));
}

#[test]
fn move_onto_card_takes_its_stage_on_primary_board() {
    let (dir, store) = seeded();
    pipeline(&dir)
        .args(["move", "a", "c", "--card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved a to Won"));
    assert_eq!(store.find("a").unwrap().stage, PrimaryStage::Win);
}

#[test]
fn move_onto_card_is_ignored_on_forecast_board() {
    let (dir, store) = seeded();
    pipeline(&dir)
        .args(["move", "a", "b", "--card", "--board", "forecast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ignores drops onto other cards"));
    assert_eq!(store.find("a").unwrap().forecast_stage, ForecastStage::Source);
}

#[test]
fn move_onto_itself_changes_nothing() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .args(["move", "a", "a", "--card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already in Sourced"));
}

// ---------------------------------------------------------------------------
// pipeline agenda / bell
// ---------------------------------------------------------------------------

#[test]
fn agenda_orders_by_due_date() {
    let (dir, _store) = seeded();
    let out = pipeline(&dir).args(["agenda", "--json"]).output().unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let tiers: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["tier"].as_str().unwrap())
        .collect();
    assert_eq!(tiers, vec!["overdue", "urgent", "later"]);
}

#[test]
fn agenda_calendar_groups_days() {
    let (dir, _store) = seeded();
    let out = pipeline(&dir)
        .args(["agenda", "--calendar", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    // From today: the overdue item is before the range, the far one after it.
    assert_eq!(json["days"].as_array().unwrap().len(), 1);
    assert_eq!(json["days"][0]["tier"], "urgent");
}

#[test]
fn bell_counts_pressing_items() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .arg("bell")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 unread"))
        .stdout(predicate::str::contains("Navy Modernization"));
}

#[test]
fn bell_mark_read_needs_server() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .args(["bell", "--mark-read"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--mark-read needs --server"));
}

// ---------------------------------------------------------------------------
// pipeline config / watch
// ---------------------------------------------------------------------------

#[test]
fn config_validate_passes_on_defaults() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_zero_deadband() {
    let (dir, _store) = seeded();
    let path = dir.path().join(".pipeline/config.yaml");
    let mut cfg: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    cfg["gestures"]["touch_distance"] = serde_yaml::Value::from(0.0);
    std::fs::write(&path, serde_yaml::to_string(&cfg).unwrap()).unwrap();

    pipeline(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning] gestures.touch_distance"));
}

#[test]
fn config_validate_fails_on_infinite_deadband() {
    let (dir, _store) = seeded();
    let path = dir.path().join(".pipeline/config.yaml");
    let mut cfg: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    cfg["gestures"]["pointer_distance"] = serde_yaml::Value::from(f64::INFINITY);
    std::fs::write(&path, serde_yaml::to_string(&cfg).unwrap()).unwrap();

    pipeline(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] gestures.pointer_distance"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn partial_board_config_is_accepted() {
    let (dir, _store) = seeded();
    std::fs::write(
        dir.path().join(".pipeline/config.yaml"),
        "boards:\n  forecast:\n    success_toast: false\n",
    )
    .unwrap();

    let out = pipeline(&dir)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["boards"]["forecast"]["success_toast"], false);
    assert_eq!(json["boards"]["forecast"]["policy"], "defer_to_next_fetch");
    assert_eq!(json["boards"]["primary"]["card_target"], "resolve_to_stage");
}

#[test]
fn config_show_json() {
    let (dir, _store) = seeded();
    let out = pipeline(&dir)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["boards"]["forecast"]["card_target"], "ignore");
    assert_eq!(json["server"]["port"], 3141);
}

#[test]
fn watch_needs_server() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("watch needs --server"));
}

#[test]
fn unreachable_server_is_reported() {
    let (dir, _store) = seeded();
    pipeline(&dir)
        .args(["board", "--server", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fetch failed"));
}

// ---------------------------------------------------------------------------
// Against a running server
// ---------------------------------------------------------------------------

#[test]
fn move_through_server_persists() {
    let (dir, store) = seeded();
    let url = start_server(&dir);
    pipeline(&dir)
        .args(["move", "b", "lost", "--server", &url])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved b to Lost"));
    assert_eq!(store.find("b").unwrap().stage, PrimaryStage::Lost);
}

#[test]
fn move_through_server_reports_foreign_stage() {
    let (dir, store) = seeded();
    let url = start_server(&dir);
    pipeline(&dir)
        .args(["move", "b", "Win", "--board", "forecast", "--server", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a forecast stage"));
    assert_eq!(store.find("b").unwrap().forecast_stage, ForecastStage::HighPriority);
}

#[test]
fn watch_reprints_after_remote_move() {
    let (dir, _store) = seeded();
    let url = start_server(&dir);

    let mut watch = std::process::Command::new(assert_cmd::cargo::cargo_bin("pipeline"))
        .args(["watch", "--max-updates", "1", "--server", &url])
        .current_dir(dir.path())
        .env("PIPELINE_ROOT", dir.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let stdout = watch.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let first = rx.recv_timeout(StdDuration::from_secs(10));
    if first.is_err() {
        let _ = watch.kill();
    }
    let first = first.expect("watch printed no initial board");
    assert!(first.contains("Sourced 1"), "got {first:?}");
    assert!(first.contains("Won 1"), "got {first:?}");

    // Give the event stream a moment to connect.
    std::thread::sleep(StdDuration::from_millis(500));
    pipeline(&dir)
        .args(["move", "a", "Win", "--server", &url])
        .assert()
        .success();

    let second = rx.recv_timeout(StdDuration::from_secs(10));
    if second.is_err() {
        let _ = watch.kill();
    }
    let second = second.expect("watch did not reprint after the move");
    assert!(second.contains("Sourced 0"), "got {second:?}");
    assert!(second.contains("Won 2"), "got {second:?}");
    assert!(watch.wait().unwrap().success());
}
