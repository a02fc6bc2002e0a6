//! Integration smoke tests for the `bevid` CLI surface.

mod common;

use tempfile::TempDir;

const BEER: &str = r#"[{"label": "a bottle of beer", "score": 0.91},
                      {"label": "a can of beer", "score": 0.05},
                      {"label": "a glass of red wine", "score": 0.02}]"#;

const SOFT_DRINK: &str = r#"[{"label": "a bottle of beer", "score": 0.30},
                            {"label": "a soft drink, juice, or water", "score": 0.52}]"#;

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains("Usage: bevid [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
    for sub in ["analyze", "identify", "config", "labels", "completions"] {
        assert!(result.stdout.contains(sub), "help missing {sub}");
    }
}

#[test]
fn version_command_prints_version() {
    let result = common::run_cli_case("version_command_prints_version", &["--version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.starts_with("bevid "));
}

#[test]
fn labels_lists_both_classes() {
    let result = common::run_cli_case("labels_lists_both_classes", &["labels"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let alcohol_at = result.stdout.find("alcohol").unwrap();
    let non_at = result.stdout.find("non-alcohol").unwrap();
    assert!(alcohol_at < non_at);
    assert!(result.stdout.contains("  a bottle of tequila"));
    assert!(result.stdout.contains("  a soft drink, juice, or water"));
}

#[test]
fn config_show_and_check_use_defaults() {
    let show = common::run_cli_case("config_show_defaults", &["config", "show"]);
    assert!(show.status.success(), "log: {}", show.log_path.display());
    assert!(show.stdout.contains("[thresholds]"));
    assert!(show.stdout.contains("high = 0.85"));

    let check = common::run_cli_case("config_check_defaults", &["config", "check"]);
    assert!(check.status.success(), "log: {}", check.log_path.display());
    assert!(check.stdout.contains("configuration OK: 14 candidates"));
}

#[test]
fn default_config_checks_and_identify_agree() {
    let check = common::run_cli_case("default_config_check", &["config", "check"]);
    assert!(check.status.success(), "log: {}", check.log_path.display());

    let tmp = TempDir::new().unwrap();
    let image = common::write_file(tmp.path(), "beer.png", common::PNG);
    let result = common::run_cli_case(
        "default_config_identify",
        &["identify", image.to_str().unwrap(), "--json"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let snapshot: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(snapshot["step"], "upload");
    assert!(snapshot["results"].is_null());
    assert!(
        snapshot["error"]
            .as_str()
            .unwrap()
            .contains("model.fixture_path")
    );
}

#[test]
fn config_check_rejects_inverted_thresholds() {
    let tmp = TempDir::new().unwrap();
    let config = common::write_file(
        tmp.path(),
        "bad.toml",
        b"[thresholds]\nhigh = 0.5\nmedium = 0.7\n",
    );
    let result = common::run_cli_case(
        "config_check_rejects_inverted_thresholds",
        &["--config", config.to_str().unwrap(), "config", "check"],
    );
    assert!(!result.status.success());
    assert!(result.stderr.contains("BEV-1001"), "log: {}", result.log_path.display());
}

#[test]
fn env_override_reaches_the_analyzer() {
    let tmp = TempDir::new().unwrap();
    let scores = common::write_file(tmp.path(), "beer.json", BEER.as_bytes());
    let result = common::run_cli_case_with_env(
        "env_override_reaches_the_analyzer",
        &["analyze", scores.to_str().unwrap(), "--json"],
        &[("BEVID_HIGH_THRESHOLD", "0.95")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let report: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(report["confidence_tier"], "medium");
}

#[test]
fn analyze_reports_false_negative_risk() {
    let tmp = TempDir::new().unwrap();
    let scores = common::write_file(tmp.path(), "soft.json", SOFT_DRINK.as_bytes());
    let result = common::run_cli_case(
        "analyze_reports_false_negative_risk",
        &["analyze", scores.to_str().unwrap(), "--json"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let report: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(report["top_label"], "a soft drink, juice, or water");
    assert_eq!(report["false_negative_risk"], true);
    assert_eq!(report["block_enrichment"], true);
    assert_eq!(report["severity"], "danger");
    assert_eq!(report["top_n"].as_array().unwrap().len(), 2);
}

#[test]
fn analyze_text_output_names_the_tier() {
    let tmp = TempDir::new().unwrap();
    let scores = common::write_file(tmp.path(), "beer.json", BEER.as_bytes());
    let result = common::run_cli_case(
        "analyze_text_output_names_the_tier",
        &["analyze", scores.to_str().unwrap()],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("top: a bottle of beer (91%)"));
    assert!(result.stdout.contains("tier: high"));
}

#[test]
fn analyze_rejects_unknown_labels() {
    let tmp = TempDir::new().unwrap();
    let scores = common::write_file(
        tmp.path(),
        "odd.json",
        br#"[{"label": "a mug of mead", "score": 0.9}]"#,
    );
    let result = common::run_cli_case(
        "analyze_rejects_unknown_labels",
        &["analyze", scores.to_str().unwrap()],
    );
    assert!(!result.status.success());
    assert!(result.stderr.contains("BEV-2002"), "log: {}", result.log_path.display());
}

#[test]
fn identify_scripted_run_reaches_result() {
    let tmp = TempDir::new().unwrap();
    let config = common::write_fixture_config(tmp.path(), BEER, "");
    let image = common::write_file(tmp.path(), "beer.png", common::PNG);
    let result = common::run_cli_case(
        "identify_scripted_run_reaches_result",
        &[
            "--config",
            config.to_str().unwrap(),
            "identify",
            image.to_str().unwrap(),
            "--events",
            "continue,accept",
            "--json",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let snapshot: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(snapshot["step"], "result");
    assert_eq!(snapshot["user_decision"], "accept");
    assert_eq!(snapshot["image"]["format"], "png");
    assert!(
        snapshot["enrichment_text"]
            .as_str()
            .unwrap()
            .starts_with("Classification: a bottle of beer")
    );
}

#[test]
fn identify_blocked_accept_shows_withheld_notice() {
    let tmp = TempDir::new().unwrap();
    let config = common::write_fixture_config(tmp.path(), SOFT_DRINK, "");
    let image = common::write_file(tmp.path(), "can.jpg", common::JPEG);
    let result = common::run_cli_case(
        "identify_blocked_accept_shows_withheld_notice",
        &[
            "--config",
            config.to_str().unwrap(),
            "identify",
            image.to_str().unwrap(),
            "--events",
            "continue,accept",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("[CAUTION]"));
    assert!(result.stdout.contains("Safety Notice"));
    assert!(result.stdout.contains("Detailed information is unavailable"));
    assert!(result.stdout.contains("[>] Step 6: Result"));
}

#[test]
fn identify_rejects_unsupported_images() {
    let tmp = TempDir::new().unwrap();
    let config = common::write_fixture_config(tmp.path(), BEER, "");
    let image = common::write_file(tmp.path(), "anim.gif", common::GIF);
    let result = common::run_cli_case(
        "identify_rejects_unsupported_images",
        &[
            "--config",
            config.to_str().unwrap(),
            "identify",
            image.to_str().unwrap(),
        ],
    );
    assert!(!result.status.success());
    assert!(result.stderr.contains("BEV-2101"), "log: {}", result.log_path.display());
}

#[test]
fn identify_rejects_out_of_order_script() {
    let tmp = TempDir::new().unwrap();
    let config = common::write_fixture_config(tmp.path(), BEER, "");
    let image = common::write_file(tmp.path(), "beer.png", common::PNG);
    let result = common::run_cli_case(
        "identify_rejects_out_of_order_script",
        &[
            "--config",
            config.to_str().unwrap(),
            "identify",
            image.to_str().unwrap(),
            "--events",
            "accept",
        ],
    );
    assert!(!result.status.success());
    assert!(result.stderr.contains("BEV-3001"), "log: {}", result.log_path.display());
}

#[test]
fn identify_writes_the_decision_journal() {
    let tmp = TempDir::new().unwrap();
    let journal = tmp.path().join("logs").join("journal.jsonl");
    let extra = format!(
        "[journal]\nenabled = true\npath = {:?}\n",
        journal.display().to_string()
    );
    let config = common::write_fixture_config(tmp.path(), BEER, &extra);
    let image = common::write_file(tmp.path(), "beer.png", common::PNG);
    let result = common::run_cli_case(
        "identify_writes_the_decision_journal",
        &[
            "--config",
            config.to_str().unwrap(),
            "identify",
            image.to_str().unwrap(),
            "--events",
            "continue,flag,continue,accept",
            "--json",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let raw = std::fs::read_to_string(&journal).unwrap();
    let events: Vec<String> = raw
        .lines()
        .map(|line| {
            let entry: serde_json::Value = serde_json::from_str(line).unwrap();
            entry["event"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        events,
        [
            "submit_image",
            "classify_finished",
            "continue",
            "flag_uncertain",
            "continue",
            "accept",
            "enrich_finished"
        ]
    );
}

#[test]
fn completions_generate_for_bash() {
    let result = common::run_cli_case("completions_generate_for_bash", &["completions", "bash"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("bevid"));
}

#[test]
fn events_flag_rejects_unknown_words() {
    let result = common::run_cli_case(
        "events_flag_rejects_unknown_words",
        &["identify", "x.png", "--events", "continue,dance"],
    );
    assert!(!result.status.success());
    assert!(result.stderr.contains("unknown scripted event `dance`"));
}
