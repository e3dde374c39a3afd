use chrono::{Duration, SecondsFormat, Utc};
use driftwatch_core::{Database, PatternType, RecommendationFilter, RecommendationStatus};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const PROJECT: &str = "widgets";

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    xdg_runtime: PathBuf,
    commits_file: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let xdg_runtime = base.join("xdg-runtime");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");
        fs::create_dir_all(&xdg_runtime).expect("failed to create XDG_RUNTIME_DIR");

        let commits_file = base.join("commits.jsonl");
        fs::write(&commits_file, ai_sprint_jsonl()).expect("failed to write commits");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
            xdg_runtime,
            commits_file,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("driftwatch/data.db")
    }

    fn write_config(&self, content: &str) {
        let dir = self.xdg_config.join("driftwatch");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("failed to write config");
    }
}

/// Ten AI feature commits over the last few days, none touching tests.
fn ai_sprint_jsonl() -> String {
    let now = Utc::now();
    (0..10)
        .map(|i| {
            let timestamp = now - Duration::hours(100 - i * 10);
            serde_json::json!({
                "sha": format!("sprint-{:02}", i),
                "message": format!("feat: generated module {}", i),
                "author_type": "ai",
                "ai_tool": "Claude Code",
                "category": "feat",
                "files_changed": 6,
                "test_files_touched": 0,
                "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn run_bin(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> Output {
    let bin_path = match bin_name {
        "driftwatch" => PathBuf::from(assert_cmd::cargo::cargo_bin!("driftwatch")),
        "driftwatch-import" => PathBuf::from(assert_cmd::cargo::cargo_bin!("driftwatch-import")),
        "driftwatch-analyze" => PathBuf::from(assert_cmd::cargo::cargo_bin!("driftwatch-analyze")),
        _ => panic!("unsupported binary in test harness: {bin_name}"),
    };

    let mut command = Command::new(bin_path);

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env("XDG_RUNTIME_DIR", &env.xdg_runtime)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute {bin_name}: {e}"))
}

fn assert_success(bin_name: &str, args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "{bin_name} {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_ok(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> String {
    let output = run_bin(env, bin_name, args);
    assert_success(bin_name, args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn import_sprint(env: &CliTestEnv) -> String {
    let file = env.commits_file.to_string_lossy().into_owned();
    run_ok(
        env,
        "driftwatch-import",
        &["--project", PROJECT, "--repo", "acme/widgets", &file],
    )
}

#[test]
fn import_is_idempotent() {
    let env = CliTestEnv::new();

    let stdout = import_sprint(&env);
    assert!(stdout.contains("Created project widgets"), "{stdout}");
    assert!(stdout.contains("Commits inserted:   10"), "{stdout}");

    let stdout = import_sprint(&env);
    assert!(!stdout.contains("Created project"), "{stdout}");
    assert!(stdout.contains("Commits inserted:   0"), "{stdout}");
    assert!(stdout.contains("Duplicates skipped: 10"), "{stdout}");

    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    assert_eq!(db.count_commits(PROJECT).unwrap(), 10);
    let project = db.get_project(PROJECT).unwrap().expect("project exists");
    assert_eq!(project.repo_full_name.as_deref(), Some("acme/widgets"));
}

#[test]
fn import_rejects_malformed_record() {
    let env = CliTestEnv::new();
    let bad = env.home.join("bad.jsonl");
    fs::write(
        &bad,
        "{\"sha\": \"a\", \"author_type\": \"ai\", \"category\": \"feat\", \"timestamp\": \"2026-01-01T00:00:00Z\"}\n{\"sha\": \"b\"}\n",
    )
    .unwrap();

    let bad = bad.to_string_lossy().into_owned();

    let output = run_bin(&env, "driftwatch-import", &["--project", PROJECT, &bad]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("record 2"), "{stderr}");
    assert!(!env.db_path().exists());
}

#[test]
fn analyze_reconciles_and_rerun_changes_nothing() {
    let env = CliTestEnv::new();
    import_sprint(&env);

    let stdout = run_ok(&env, "driftwatch-analyze", &["--windows"]);
    assert!(stdout.contains("Project: widgets"), "{stdout}");
    assert!(stdout.contains("[critical] AI Handoff Cliff"), "{stdout}");
    assert!(stdout.contains("Created: 1, Resolved: 0"), "{stdout}");
    assert!(stdout.contains("[Claude Code]"), "{stdout}");

    let stdout = run_ok(&env, "driftwatch-analyze", &["--project", PROJECT]);
    assert!(stdout.contains("Created: 0, Resolved: 0"), "{stdout}");
    assert!(stdout.contains("Analyzed 1 project(s): 0 created, 0 resolved"), "{stdout}");

    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");

    let active = db
        .list_recommendations(PROJECT, &RecommendationFilter::default())
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].pattern, PatternType::AiHandoffCliff);

    let runs = db.get_analysis_runs(PROJECT, 10).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].created_count, 0);
    assert_eq!(runs[1].created_count, 1);
    assert!(db.get_project(PROJECT).unwrap().unwrap().last_analyzed_at.is_some());
}

#[test]
fn analyze_json_output_parses() {
    let env = CliTestEnv::new();
    import_sprint(&env);

    let stdout = run_ok(&env, "driftwatch-analyze", &["--format", "json"]);
    let results: serde_json::Value =
        serde_json::from_str(&stdout).expect("analyze --format json should print JSON");

    let results = results.as_array().expect("an array of results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["project_id"], PROJECT);
    assert_eq!(results[0]["created"], 1);
    assert_eq!(
        results[0]["recommendations"][0]["pattern"],
        "ai-handoff-cliff"
    );
    assert_eq!(results[0]["windows"].as_array().unwrap().len(), 1);
}

#[test]
fn analyze_unknown_project_fails() {
    let env = CliTestEnv::new();
    let output = run_bin(&env, "driftwatch-analyze", &["--project", "nope"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No project found"));
}

#[test]
fn list_detectors_honors_config() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, "driftwatch-analyze", &["--list-detectors"]);
    assert_eq!(stdout.matches("  - ").count(), 7, "{stdout}");

    env.write_config(
        r#"
[analysis]
disabled_detectors = ["tool-transition"]
"#,
    );
    let stdout = run_ok(&env, "driftwatch-analyze", &["--list-detectors"]);
    assert_eq!(stdout.matches("  - ").count(), 6, "{stdout}");
    assert!(!stdout.contains("tool-transition"), "{stdout}");
}

#[test]
fn acknowledge_dismiss_and_label() {
    let env = CliTestEnv::new();
    import_sprint(&env);
    run_ok(&env, "driftwatch-analyze", &[]);

    let db = Database::open(&env.db_path()).expect("failed to open db");
    let id = db
        .list_recommendations(PROJECT, &RecommendationFilter::default())
        .unwrap()
        .remove(0)
        .id;

    let stdout = run_ok(&env, "driftwatch", &["recommendations", PROJECT]);
    assert!(stdout.contains(&id), "{stdout}");

    let stdout = run_ok(&env, "driftwatch", &["ack", &id]);
    assert!(stdout.contains("is now acknowledged"), "{stdout}");

    // Closed rows cannot move again
    let output = run_bin(&env, "driftwatch", &["dismiss", &id]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot move"));

    let stdout = run_ok(&env, "driftwatch", &["label", &id, "true-positive"]);
    assert!(stdout.contains("true-positive"), "{stdout}");

    let rec = db.get_recommendation(&id).unwrap().unwrap();
    assert_eq!(rec.status, RecommendationStatus::Acknowledged);
    assert!(rec.acknowledged_at.is_some());
    assert!(rec.accuracy.is_some());

    let stdout = run_ok(&env, "driftwatch", &["recommendations", PROJECT]);
    assert!(stdout.contains("No recommendations."), "{stdout}");
    let stdout = run_ok(
        &env,
        "driftwatch",
        &["recommendations", PROJECT, "--status", "all"],
    );
    assert!(stdout.contains("acknowledged"), "{stdout}");
}

#[test]
fn projects_and_overview() {
    let env = CliTestEnv::new();
    import_sprint(&env);

    let stdout = run_ok(&env, "driftwatch", &["projects"]);
    assert!(stdout.contains("widgets"), "{stdout}");
    assert!(stdout.contains("never"), "{stdout}");

    let stdout = run_ok(&env, "driftwatch", &["--format", "json", "overview", PROJECT]);
    let overview: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(overview["commit_count"], 10);
    assert_eq!(overview["active_recommendations"], 0);
    assert_eq!(overview["current_window"]["ai_commits"], 10);
    assert!(overview["last_analyzed_at"].is_null());

    let output = run_bin(&env, "driftwatch", &["overview", "nope"]);
    assert!(!output.status.success());
}

#[test]
fn runs_and_label_honor_json_format() {
    let env = CliTestEnv::new();
    import_sprint(&env);
    run_ok(&env, "driftwatch-analyze", &[]);

    let stdout = run_ok(&env, "driftwatch", &["--format", "json", "runs", PROJECT]);
    let runs: serde_json::Value =
        serde_json::from_str(&stdout).expect("runs --format json should print JSON");
    let runs = runs.as_array().expect("an array of runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["project_id"], PROJECT);
    assert_eq!(runs[0]["commit_count"], 10);
    assert_eq!(runs[0]["created_count"], 1);
    assert_eq!(runs[0]["detected"][0], "ai-handoff-cliff");

    let stdout = run_ok(&env, "driftwatch", &["runs", PROJECT]);
    assert!(serde_json::from_str::<serde_json::Value>(&stdout).is_err());
    assert!(stdout.contains("ai-handoff-cliff"), "{stdout}");

    let db = Database::open(&env.db_path()).expect("failed to open db");
    let id = db
        .list_recommendations(PROJECT, &RecommendationFilter::default())
        .unwrap()
        .remove(0)
        .id;

    let stdout = run_ok(&env, "driftwatch", &["label", &id, "useful", "--format", "json"]);
    let labeled: serde_json::Value =
        serde_json::from_str(&stdout).expect("label --format json should print JSON");
    assert_eq!(labeled["id"], id.as_str());
    assert_eq!(labeled["accuracy"], "useful");
}

#[test]
fn history_filters_by_range() {
    let env = CliTestEnv::new();
    import_sprint(&env);

    let stdout = run_ok(&env, "driftwatch", &["--format", "json", "history", PROJECT]);
    let windows: serde_json::Value =
        serde_json::from_str(&stdout).expect("history --format json should print JSON");
    let windows = windows.as_array().expect("an array of windows");
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0]["total_commits"], 10);
    assert_eq!(windows[0]["ai_commits"], 10);

    // Only the last five sprint commits fall after the cutoff
    let since = (Utc::now() - Duration::hours(55)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let stdout = run_ok(
        &env,
        "driftwatch",
        &["--format", "json", "history", PROJECT, "--since", &since],
    );
    let windows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(windows[0]["total_commits"], 5);

    let stdout = run_ok(&env, "driftwatch", &["history", PROJECT]);
    assert!(stdout.contains("10 commits"), "{stdout}");

    let stdout = run_ok(&env, "driftwatch", &["history", PROJECT, "--until", "2000-01-01"]);
    assert!(stdout.contains("No commits in range."), "{stdout}");

    let output = run_bin(&env, "driftwatch", &["history", PROJECT, "--since", "last week"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid time"));

    let output = run_bin(&env, "driftwatch", &["history", "nope"]);
    assert!(!output.status.success());
}
