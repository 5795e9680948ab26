use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::tempdir;

fn run_chainterm(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chainterm"))
        .current_dir(cwd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("chainterm command should run")
}

fn run_chainterm_with_input(cwd: &Path, args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_chainterm"))
        .current_dir(cwd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("chainterm command should spawn");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input.as_bytes())
        .expect("stdin should write");
    child
        .wait_with_output()
        .expect("chainterm command should finish")
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

fn write_config(dir: &Path, yaml: &str) {
    fs::write(dir.join("chainterm.yaml"), yaml).expect("config should write");
}

#[test]
fn frame_json_lists_layers_back_to_front() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_chainterm(dir.path(), &["frame", "--progress", "0.5", "--json"]);
    assert!(output.status.success(), "frame should succeed");

    let frame = parse_json(&output);
    let layers = frame["layers"].as_array().expect("layers should be array");
    assert_eq!(layers.len(), 5);
    assert_eq!(layers[0]["id"], "back-lower");
    assert_eq!(layers[4]["id"], "foreground");
    assert_eq!(layers[4]["elements"].as_array().map(Vec::len), Some(9));
    assert_eq!(layers[4]["chain_offset"].as_f64(), Some(-300.0));
}

#[test]
fn frame_json_is_stable_across_runs() {
    let dir = tempdir().expect("tempdir should create");
    let first = run_chainterm(dir.path(), &["frame", "--progress", "0.25", "--json"]);
    let second = run_chainterm(dir.path(), &["frame", "--progress", "0.25", "--json"]);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout, "frame output should be deterministic");
}

#[test]
fn out_of_range_progress_is_a_coded_usage_error() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_chainterm(dir.path(), &["frame", "--progress", "1.5", "--json"]);
    assert_eq!(output.status.code(), Some(2));

    let envelope = parse_json(&output);
    assert_eq!(envelope["ok"], false);
    assert_eq!(envelope["error"]["code"], "E_PROGRESS_RANGE");
    assert_eq!(envelope["error"]["details"]["provided"].as_f64(), Some(1.5));
}

#[test]
fn lighting_facing_the_light_is_brightest() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_chainterm(dir.path(), &["lighting", "--angle", "0", "--json"]);
    assert!(output.status.success());

    let report = parse_json(&output);
    assert_eq!(report["lighting"]["brightness"].as_f64(), Some(100.0));

    let away = parse_json(&run_chainterm(
        dir.path(),
        &["lighting", "--angle", "180", "--json"],
    ));
    assert_eq!(away["lighting"]["brightness"].as_f64(), Some(40.0));
}

#[test]
fn articles_come_from_the_configured_directory() {
    let dir = tempdir().expect("tempdir should create");
    fs::create_dir(dir.path().join("posts")).expect("posts dir should create");
    fs::write(
        dir.path().join("posts/hello-chain.md"),
        "---\ntitle: Hello Chain\ndate: 2024-06-01\ntags: [motion]\n---\nFirst post.\n",
    )
    .expect("article should write");
    write_config(dir.path(), "content:\n  articles_dir: posts\n");

    let listed = run_chainterm(
        dir.path(),
        &["--config", "chainterm.yaml", "articles", "list", "--json"],
    );
    assert!(listed.status.success(), "articles list should succeed");
    let articles = parse_json(&listed);
    let articles = articles.as_array().expect("articles should be array");
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["slug"], "hello-chain");
    assert_eq!(articles[0]["author"], "Point Labs");
    assert!(articles[0].get("body_text").is_none());

    let shown = run_chainterm(
        dir.path(),
        &["--config", "chainterm.yaml", "articles", "show", "hello-chain"],
    );
    assert!(shown.status.success());
    let stdout = String::from_utf8_lossy(&shown.stdout);
    assert!(stdout.starts_with("Hello Chain\n"));
    assert!(stdout.contains("First post."));
}

#[test]
fn unknown_article_is_a_coded_not_found_error() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_chainterm(dir.path(), &["articles", "show", "missing", "--json"]);
    assert_eq!(output.status.code(), Some(3));

    let envelope = parse_json(&output);
    assert_eq!(envelope["error"]["code"], "E_ARTICLE_NOT_FOUND");
    assert_eq!(envelope["error"]["details"]["slug"], "missing");
}

#[test]
fn invalid_config_is_reported_with_its_code() {
    let dir = tempdir().expect("tempdir should create");
    write_config(dir.path(), "chain:\n  spring:\n    stiffnes: 10\n");

    let output = run_chainterm(dir.path(), &["--config", "chainterm.yaml", "check", "--json"]);
    assert_eq!(output.status.code(), Some(4));
    let envelope = parse_json(&output);
    assert_eq!(envelope["error"]["code"], "E_CONFIG_INVALID");

    let plain = run_chainterm(dir.path(), &["--config", "chainterm.yaml", "check"]);
    assert!(!plain.status.success());
    assert!(String::from_utf8_lossy(&plain.stderr).contains("error:"));
}

#[test]
fn check_summarizes_stock_settings() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_chainterm(dir.path(), &["check"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("OK: stock settings (5 layers, 59 elements, 4 script items)"),
        "unexpected check output: {stdout}"
    );
}

#[test]
fn skipped_terminal_accepts_piped_commands() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_chainterm_with_input(
        dir.path(),
        &["terminal", "--skip"],
        "cat mission.txt\nnope\nexit\nls\n",
    );
    assert!(output.status.success(), "terminal should exit cleanly");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("$ pointlabs --version"));
    assert!(stdout.contains("try: cat values.txt | clear | help | ls"));
    assert!(stdout.contains("$ cat mission.txt"));
    assert!(stdout.contains("Point Labs Mission Statement"));
    assert!(stdout.contains("! command not found: nope"));
    assert!(!stdout.contains("$ ls"), "input after exit should be ignored");
}

#[test]
fn terminal_json_reports_final_state() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_chainterm_with_input(
        dir.path(),
        &["terminal", "--reduced-motion", "--json"],
        "pwd\n",
    );
    assert!(output.status.success());

    let state = parse_json(&output);
    assert_eq!(state["mode"], "interactive");
    assert_eq!(state["typewriter_complete"], true);
    let history = state["history"].as_array().expect("history should be array");
    assert_eq!(
        history.last().and_then(|line| line["text"].as_str()),
        Some("~/pointlabs")
    );
    assert_eq!(state["command_history"][0], "pwd");
}

#[test]
fn terminal_speed_outside_its_range_is_a_usage_error() {
    let dir = tempdir().expect("tempdir should create");
    for speed in ["1e-300", "0", "1000"] {
        let output = run_chainterm(dir.path(), &["terminal", "--speed", speed, "--json"]);
        assert_eq!(output.status.code(), Some(2), "speed {speed} should be rejected");

        let envelope = parse_json(&output);
        assert_eq!(envelope["error"]["code"], "E_SPEED_RANGE");
        assert_eq!(envelope["error"]["details"]["allowed"][1].as_f64(), Some(100.0));
    }

    let accepted = run_chainterm(dir.path(), &["terminal", "--speed", "100", "--skip"]);
    assert!(accepted.status.success(), "upper bound should be accepted");
}
