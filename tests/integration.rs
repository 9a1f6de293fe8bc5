use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fbl_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("fbl");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // The disabled AI provider keeps these tests offline: creation falls
    // back to neutral, summarization surfaces an unavailable error.
    let config_content = format!(
        r#"[db]
path = "{}/data/feedback.sqlite"

[server]
bind = "127.0.0.1:7410"

[ai]
provider = "disabled"

[pagination]
default_page_size = 20
max_page_size = 100

[summary]
max_batch_size = 50

[stats]
recent_window_days = 7
"#,
        root.display()
    );

    let config_path = config_dir.join("fbl.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_fbl(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = fbl_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run fbl binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn add(config_path: &Path, text: &str, source: &str) {
    let (stdout, stderr, success) =
        run_fbl(config_path, &["add", "--text", text, "--source", source]);
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_fbl(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("feedback.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_fbl(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_fbl(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_add_falls_back_to_neutral_when_provider_disabled() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (stdout, stderr, success) = run_fbl(
        &config_path,
        &[
            "add",
            "--text",
            "Love the new dark mode feature!",
            "--source",
            "survey",
        ],
    );
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(
        stdout.contains("sentiment:  neutral"),
        "Expected neutral fallback, got: {}",
        stdout
    );
}

#[test]
fn test_add_rejects_unknown_source() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (_, stderr, success) = run_fbl(
        &config_path,
        &["add", "--text", "hello", "--source", "carrier_pigeon"],
    );
    assert!(!success, "Unknown source should fail");
    assert!(
        stderr.contains("unknown source"),
        "Should name the bad source, got: {}",
        stderr
    );
}

#[test]
fn test_add_rejects_empty_text() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (_, stderr, success) = run_fbl(
        &config_path,
        &["add", "--text", "   ", "--source", "survey"],
    );
    assert!(!success, "Blank text should fail");
    assert!(
        stderr.contains("must not be empty"),
        "Should mention empty text, got: {}",
        stderr
    );
}

#[test]
fn test_add_rejects_malformed_metadata() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (_, stderr, success) = run_fbl(
        &config_path,
        &[
            "add",
            "--text",
            "hello",
            "--source",
            "survey",
            "--metadata",
            "{not json",
        ],
    );
    assert!(!success, "Malformed metadata should fail");
    assert!(
        stderr.contains("metadata"),
        "Should mention metadata, got: {}",
        stderr
    );
}

#[test]
fn test_list_shows_created_feedback() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    add(&config_path, "The app crashes on upload", "app_store");
    add(&config_path, "Support was quick to respond", "support_ticket");

    let (stdout, _, success) = run_fbl(&config_path, &["list"]);
    assert!(success, "list failed");
    assert!(stdout.contains("The app crashes on upload"));
    assert!(stdout.contains("Support was quick to respond"));
    assert!(stdout.contains("(2 total)"), "Expected 2 total, got: {}", stdout);
}

#[test]
fn test_list_newest_first() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    add(&config_path, "first entry", "survey");
    add(&config_path, "second entry", "survey");

    let (stdout, _, _) = run_fbl(&config_path, &["list"]);
    let first_pos = stdout.find("first entry").expect("first entry missing");
    let second_pos = stdout.find("second entry").expect("second entry missing");
    assert!(
        second_pos < first_pos,
        "Newest record should come first, got: {}",
        stdout
    );
}

#[test]
fn test_list_filter_by_source() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    add(&config_path, "from the survey", "survey");
    add(&config_path, "from the app store", "app_store");

    let (stdout, _, success) = run_fbl(&config_path, &["list", "--source", "survey"]);
    assert!(success);
    assert!(stdout.contains("from the survey"));
    assert!(!stdout.contains("from the app store"));
    assert!(stdout.contains("(1 total)"));
}

#[test]
fn test_list_rejects_malformed_date() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (_, stderr, success) = run_fbl(&config_path, &["list", "--since", "not-a-date"]);
    assert!(!success, "Malformed date should fail");
    assert!(
        stderr.contains("start_date"),
        "Should name the offending field, got: {}",
        stderr
    );
}

#[test]
fn test_list_empty_store() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (stdout, _, success) = run_fbl(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("No feedback"));
}

#[test]
fn test_get_roundtrip() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    add(&config_path, "A record worth fetching", "survey");

    let (stdout, _, success) = run_fbl(&config_path, &["get", "1"]);
    assert!(success, "get should succeed");
    assert!(stdout.contains("A record worth fetching"));
    assert!(stdout.contains("source:     survey"));
}

#[test]
fn test_get_missing_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (_, stderr, success) = run_fbl(&config_path, &["get", "999"]);
    assert!(!success, "get with missing id should fail");
    assert!(
        stderr.contains("not found"),
        "Should report not found, got: {}",
        stderr
    );
}

#[test]
fn test_stats_counts() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    add(&config_path, "one", "survey");
    add(&config_path, "two", "survey");
    add(&config_path, "three", "app_store");

    let (stdout, _, success) = run_fbl(&config_path, &["stats"]);
    assert!(success, "stats failed");
    assert!(stdout.contains("Feedback:  3"));
    // Everything was just created, so the whole corpus is recent.
    assert!(stdout.contains("Recent:    3"));
    assert!(stdout.contains("survey"));
    assert!(stdout.contains("app_store"));
    // All classifications fell back to neutral under the disabled provider.
    assert!(stdout.contains("neutral"));
    assert!(!stdout.contains("positive"));
}

#[test]
fn test_stats_empty_store() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (stdout, _, success) = run_fbl(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Feedback:  0"));
}

#[test]
fn test_summarize_empty_store() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (_, stderr, success) = run_fbl(&config_path, &["summarize"]);
    assert!(!success, "Summarize over an empty store should fail");
    assert!(
        stderr.contains("nothing to summarize"),
        "Should say nothing to summarize, got: {}",
        stderr
    );
}

#[test]
fn test_summarize_missing_ids_is_empty_batch() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    add(&config_path, "exists", "survey");

    let (_, stderr, success) = run_fbl(&config_path, &["summarize", "--ids", "998,999"]);
    assert!(!success, "Summarize over unknown ids should fail");
    assert!(
        stderr.contains("nothing to summarize"),
        "Unknown ids are dropped, leaving an empty batch, got: {}",
        stderr
    );
}

#[test]
fn test_summarize_provider_disabled_is_unavailable() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    add(&config_path, "something to summarize", "survey");

    let (_, stderr, success) = run_fbl(&config_path, &["summarize"]);
    assert!(!success, "Summarize without a provider should fail");
    assert!(
        stderr.contains("unavailable"),
        "Should report the provider as unavailable, got: {}",
        stderr
    );
}

#[test]
fn test_reclassify_missing_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_fbl(&config_path, &["init"]);
    let (_, stderr, success) = run_fbl(&config_path, &["reclassify", "42"]);
    assert!(!success, "Reclassify with missing id should fail");
    assert!(stderr.contains("not found"));
}

#[test]
fn test_unknown_provider_in_config_rejected() {
    let (tmp, _) = setup_test_env();
    let root = tmp.path();

    let config_content = format!(
        r#"[db]
path = "{}/data/feedback.sqlite"

[server]
bind = "127.0.0.1:7410"

[ai]
provider = "delphi"
model = "oracle-1"
"#,
        root.display()
    );
    let config_path = root.join("config").join("bad.toml");
    fs::write(&config_path, config_content).unwrap();

    let (_, stderr, success) = run_fbl(&config_path, &["init"]);
    assert!(!success, "Unknown provider should fail config validation");
    assert!(
        stderr.contains("Unknown AI provider"),
        "Should mention the provider, got: {}",
        stderr
    );
}
