use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn lot_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("lot");
    path
}

const FEED: &str = r#"[
  {"vin": "1FTFW1E50PFA00001", "stock": "A100", "year": "2025", "make": "Ford",
   "model": "F-150", "trim": "XLT", "paint": "Oxford White",
   "drivetrain": "4WD", "engine": "2.7L V-6 EcoBoost", "msrp": "$52,345",
   "optional": [{"description": "Twin Panel Moonroof", "code": "43S"}]},
  {"vin": "1FTFW1E50PFA00002", "stock": "A101", "year": "2025", "make": "Ford",
   "model": "F-150", "trim": "Lariat", "paint": "Agate Black Metallic",
   "drivetrain": "4x4", "engine": "3.5L V6 EcoBoost", "msrp": "$68,900"},
  {"vin": "1FMDE5BH0PLA00003", "year": "2025", "make": "Ford",
   "model": "Bronco", "trim": "Badlands", "paint": "Cactus Gray",
   "drivetrain": "4x4", "msrp": 61000},
  {"stock": "NOVIN", "model": "Ranger"}
]"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(root.join("feed.json"), FEED).unwrap();

    let config_content = format!(
        r#"[source]
path = "{}/data/inventory.sqlite"

[snapshot]
dir = "{}/data/cache"

[server]
bind = "127.0.0.1:7341"
"#,
        root.display(),
        root.display()
    );

    let config_path = config_dir.join("lot.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_lot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = lot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run lot binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// init + import + materialize, asserting each step.
fn load(tmp: &TempDir, config_path: &Path) {
    let (_, stderr, success) = run_lot(config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);

    let feed = tmp.path().join("feed.json");
    let (stdout, stderr, success) = run_lot(config_path, &["import", feed.to_str().unwrap()]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);

    let (stdout, stderr, success) = run_lot(config_path, &["materialize"]);
    assert!(success, "materialize failed: stdout={}, stderr={}", stdout, stderr);
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_lot(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/inventory.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_lot(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_lot(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_counts_and_skips_rows_without_vin() {
    let (tmp, config_path) = setup_test_env();
    let feed = tmp.path().join("feed.json");

    run_lot(&config_path, &["init"]);
    let (stdout, stderr, success) = run_lot(&config_path, &["import", feed.to_str().unwrap()]);
    assert!(success, "import failed: {}", stderr);
    assert!(stdout.contains("upserted: 3"));
    assert!(stdout.contains("skipped: 1"));
    assert!(stdout.contains("ok"));

    // Re-import replaces rows instead of duplicating them.
    let (stdout, _, _) = run_lot(&config_path, &["import", feed.to_str().unwrap()]);
    assert!(stdout.contains("upserted: 3"));
}

#[test]
fn test_import_prune_removes_missing_vins() {
    let (tmp, config_path) = setup_test_env();
    let feed = tmp.path().join("feed.json");
    run_lot(&config_path, &["init"]);
    run_lot(&config_path, &["import", feed.to_str().unwrap()]);

    let smaller = tmp.path().join("smaller.json");
    fs::write(&smaller, r#"[{"vin": "1FTFW1E50PFA00001", "stock": "A100", "model": "F-150"}]"#).unwrap();
    let (stdout, stderr, success) =
        run_lot(&config_path, &["import", smaller.to_str().unwrap(), "--prune"]);
    assert!(success, "prune import failed: {}", stderr);
    assert!(stdout.contains("pruned: 2"));
}

#[test]
fn test_materialize_writes_snapshots_then_noops() {
    let (tmp, config_path) = setup_test_env();
    load(&tmp, &config_path);

    assert!(tmp.path().join("data/cache/inventory_cache.json").exists());
    assert!(tmp.path().join("data/cache/inventory_cache_lite.json").exists());

    let (stdout, _, success) = run_lot(&config_path, &["materialize"]);
    assert!(success);
    assert!(stdout.contains("snapshots current"));

    let (stdout, _, success) = run_lot(&config_path, &["materialize", "--force"]);
    assert!(success);
    assert!(stdout.contains("vehicles: 3"));
}

#[test]
fn test_list_from_snapshot() {
    let (tmp, config_path) = setup_test_env();
    load(&tmp, &config_path);

    let (stdout, stderr, success) = run_lot(&config_path, &["list", "--per-page", "2"]);
    assert!(success, "list failed: {}", stderr);
    let body: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["servedFrom"], "snapshot");
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["vehicles"][0]["stock"], "A100");
}

#[test]
fn test_list_with_filters_scans() {
    let (tmp, config_path) = setup_test_env();
    load(&tmp, &config_path);

    let (stdout, stderr, success) = run_lot(
        &config_path,
        &[
            "list",
            "--model",
            "f150",
            "--filter",
            "color=Agate Black",
            "--facets",
        ],
    );
    assert!(success, "list failed: {}", stderr);
    let body: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["servedFrom"], "scan");
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["vehicles"][0]["vin"], "1FTFW1E50PFA00002");
    assert_eq!(body["facets"]["color"]["Oxford White"], 1);

    let (stdout, _, _) = run_lot(
        &config_path,
        &["list", "--model", "f150", "--exclude", "trim=XLT"],
    );
    let body: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["totalCount"], 1);
}

#[test]
fn test_list_rejects_bad_sort() {
    let (tmp, config_path) = setup_test_env();
    load(&tmp, &config_path);

    let (_, _, success) = run_lot(&config_path, &["list", "--sort", "cheapest"]);
    assert!(!success);
}

#[test]
fn test_get_by_stock_and_vin() {
    let (tmp, config_path) = setup_test_env();
    load(&tmp, &config_path);

    let (stdout, stderr, success) = run_lot(&config_path, &["get", "A101"]);
    assert!(success, "get failed: {}", stderr);
    assert!(stdout.contains("1FTFW1E50PFA00002"));

    let (stdout, _, success) = run_lot(&config_path, &["get", "1FMDE5BH0PLA00003"]);
    assert!(success);
    assert!(stdout.contains("(in transit)"));
}

#[test]
fn test_get_missing_exits_nonzero() {
    let (tmp, config_path) = setup_test_env();
    load(&tmp, &config_path);

    let (_, stderr, success) = run_lot(&config_path, &["get", "NOPE"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_facets_prints_histogram() {
    let (tmp, config_path) = setup_test_env();
    load(&tmp, &config_path);

    let (stdout, stderr, success) = run_lot(&config_path, &["facets"]);
    assert!(success, "facets failed: {}", stderr);
    assert!(stdout.contains("Vehicles:      3"));
    assert!(stdout.contains("Agate Black"));
    assert!(stdout.contains("in-transit"));
}

#[test]
fn test_audit_reports_unmatched_values() {
    let (tmp, config_path) = setup_test_env();
    load(&tmp, &config_path);

    let (stdout, stderr, success) = run_lot(&config_path, &["audit"]);
    assert!(success, "audit failed: {}", stderr);
    assert!(stdout.contains("audit: 3 vehicles"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_missing_config_fails() {
    let (_, _, success) = run_lot(Path::new("/nonexistent/lot.toml"), &["init"]);
    assert!(!success);
}
