use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("applies").unwrap();
    cmd.current_dir(home.path()).args(["--log", "terminal"]);
    cmd
}

#[test]
fn every_command_has_help() {
    let home = TempDir::new().unwrap();
    let subcommands: [&[&str]; 5] = [&[], &["inspect"], &["extract"], &["cache"], &["badge"]];
    for sub in subcommands {
        cmd(&home).args(sub).arg("--help").assert().success();
    }
}

#[test]
fn extract_reports_count_and_path() {
    let home = TempDir::new().unwrap();
    let body = home.path().join("body.json");
    fs::write(&body, r#"{"included": [{"title": "x", "applyCount": 1234}]}"#).unwrap();

    cmd(&home)
        .arg("extract")
        .arg(&body)
        .assert()
        .success()
        .stdout(contains("1,234 (from included[0].applyCount)"));
}

#[test]
fn extract_json_output() {
    let home = TempDir::new().unwrap();
    let body = home.path().join("body.json");
    fs::write(&body, r#"{"data": {"applies": 42}}"#).unwrap();

    cmd(&home)
        .args(["--json", "extract"])
        .arg(&body)
        .assert()
        .success()
        .stdout(contains("\"sourceKeyHint\": \"data.applies\""));
}

#[test]
fn extract_rejects_invalid_json() {
    let home = TempDir::new().unwrap();
    let body = home.path().join("body.json");
    fs::write(&body, "not json").unwrap();

    cmd(&home).arg("extract").arg(&body).assert().failure();
}

#[test]
fn badge_for_job_url() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["badge", "https://www.linkedin.com/jobs/search/?currentJobId=1"])
        .assert()
        .success()
        .stdout(contains("LinkedIn Jobs detected"));
    cmd(&home)
        .args(["badge", "https://www.linkedin.com/feed/"])
        .assert()
        .success()
        .stdout(contains("LinkedIn Job Insights"));
}

#[test]
fn cache_lists_persisted_counts() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("applies_cache.ron"),
        r#"{"applies:77": (applies: 12.0, at: 0, url: "https://www.linkedin.com/voyager/api/jobs/jobPostings/77")}"#,
    )
    .unwrap();

    cmd(&home)
        .args(["cache", "--dir", "."])
        .assert()
        .success()
        .stdout(contains("applies:77  12"));
}

#[test]
fn inspect_off_jobs_page_fails_without_network() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["inspect", "--page-url", "https://www.linkedin.com/feed/"])
        .assert()
        .failure()
        .stderr(contains("Not a /jobs/ page"));
}

#[test]
fn verbose_raises_only_the_named_context() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["--verbose", "content", "badge", "https://www.linkedin.com/feed/"])
        .assert()
        .success()
        .stderr(contains("page=normal content=verbose ui=normal"));
}
