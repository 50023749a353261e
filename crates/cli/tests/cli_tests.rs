//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

const REDDIT_URL: &str = "https://www.reddit.com/r/rust/comments/1abcde/tips_for_fighting_the_borrow_checker_less/";

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("sift")
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn get_site_fixture_path(site: &str, name: &str) -> String {
    format!("../../tests/fixtures/sites/{}/{}", site, name)
}

#[test]
fn test_cli_file_input() {
    cmd().arg(get_fixture_path("semantic_article.html")).assert().success();
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("semantic_article.html")).unwrap();
    cmd()
        .arg("-")
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("Trees that point back at their parents"));
}

#[test]
fn test_cli_markdown_format() {
    cmd()
        .args(["-f", "markdown", &get_fixture_path("semantic_article.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Arenas in Practice"));
}

#[test]
fn test_cli_html_format() {
    cmd()
        .args(["-f", "html", &get_fixture_path("semantic_article.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<article>"));
}

#[test]
fn test_cli_text_format() {
    cmd()
        .args(["-f", "text", &get_fixture_path("plain_div.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tomatoes want more sun"))
        .stdout(predicate::str::contains("<p>").not());
}

#[test]
fn test_cli_json_format() {
    let output = cmd()
        .args(["-f", "json", &get_fixture_path("semantic_article.html")])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stage"], "semantic");
    assert!(json["quality_score"].as_u64().unwrap() >= 60);
    assert_eq!(json["fallbacks_used"][0], "site-specific-gate-failed");
}

#[test]
fn test_cli_disabled_stages_fall_to_heuristic() {
    let output = cmd()
        .args(["--no-site-specific", "--no-semantic", "--no-readability", "-f", "json"])
        .arg(get_fixture_path("semantic_article.html"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stage"], "heuristic");
    assert_eq!(json["fallbacks_used"].as_array().unwrap().len(), 0);
}

#[test]
fn test_cli_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("sift.json");
    std::fs::write(&config, r#"{"enable_semantic": false, "enable_readability": false}"#).unwrap();

    let output = cmd()
        .args(["-f", "json", "--config", config.to_str().unwrap()])
        .arg(get_fixture_path("semantic_article.html"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stage"], "heuristic");
}

#[test]
fn test_cli_rejects_unknown_config_field() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("sift.json");
    std::fs::write(&config, r#"{"enable_everything": true}"#).unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap()])
        .arg(get_fixture_path("semantic_article.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_cli_missing_profile_fails() {
    cmd()
        .args(["--profile", "does-not-exist.json"])
        .arg(get_fixture_path("semantic_article.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open profile"));
}

#[test]
fn test_cli_reddit_site_specific() {
    cmd()
        .args(["--url", REDDIT_URL, "-f", "text"])
        .arg(get_site_fixture_path("reddit", "post.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Tips for fighting the borrow checker less"))
        .stdout(predicate::str::contains("## Comments"));
}

#[test]
fn test_cli_reddit_html_wraps_lines() {
    cmd()
        .args(["--url", REDDIT_URL, "-f", "html"])
        .arg(get_site_fixture_path("reddit", "post.html"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<article>"))
        .stdout(predicate::str::contains("<h2>Comments</h2>"));
}

#[test]
fn test_cli_invalid_url_fails() {
    cmd()
        .args(["--url", "not a url"])
        .arg(get_fixture_path("semantic_article.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URL"));
}

#[test]
fn test_cli_report() {
    cmd()
        .args(["--report", &get_fixture_path("semantic_article.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("PASSED"));
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", &get_fixture_path("semantic_article.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Sift"))
        .stderr(predicate::str::contains("Extraction Details"));
}

#[test]
fn test_cli_empty_document_fails() {
    cmd()
        .arg(get_fixture_path("empty.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No content could be extracted"));
}

#[test]
fn test_cli_missing_file_fails() {
    cmd()
        .arg("nonexistent.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_cli_invalid_format_fails() {
    cmd()
        .args(["-f", "pdf", &get_fixture_path("semantic_article.html")])
        .assert()
        .failure();
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("output.md");

    cmd()
        .args(["-o", output.to_str().unwrap()])
        .arg(get_fixture_path("semantic_article.html"))
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("Arenas in Practice"));
}
