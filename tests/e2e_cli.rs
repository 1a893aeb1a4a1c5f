//! CLI end-to-end tests
//!
//! Runs the plex-export binary against a mock media server.

mod common;

use assert_cmd::prelude::*;
use common::{TestHarness, TOKEN};
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the plex-export binary, isolated from any config in
/// the working directory.
#[allow(deprecated)]
fn plex_export_cmd() -> Command {
    let mut cmd = Command::cargo_bin("plex-export").unwrap();
    cmd.current_dir(std::env::temp_dir());
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = plex_export_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = plex_export_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plex-export"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = plex_export_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args(["check", "--url", &harness.url(), "--token", TOKEN])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server: Den"))
        .stdout(predicate::str::contains("Version: 1.40.0"))
        .stdout(predicate::str::contains("Current server: Den"))
        .stdout(predicate::str::contains("Library entries: 2"));
}

#[test]
fn test_cli_check_json() {
    let harness = TestHarness::with_catalog();
    let output = plex_export_cmd()
        .args(["check", "--json", "--url", &harness.url_with_token()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "Den");
    assert_eq!(json["machine_identifier"], "m-2");
    assert_eq!(json["current_server"], "Den");
    assert_eq!(json["exporter_version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_cli_check_without_token_fails() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args(["check", "--url", &harness.url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to access plex at"));
}

#[test]
fn test_cli_check_unreachable_server() {
    let mut cmd = plex_export_cmd();
    cmd.args(["check", "--url", "http://127.0.0.1:1/", "--timeout", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to access plex at http://127.0.0.1:1/"));
}

#[test]
fn test_cli_ls_follows_path() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args(["ls", "library", "sections", "--url", &harness.url_with_token()])
        .assert()
        .success()
        .stdout(predicate::str::contains("MovieDirectory"))
        .stdout(predicate::str::contains("Movies"))
        .stdout(predicate::str::contains("ShowDirectory"))
        .stdout(predicate::str::contains("TV Shows"));
}

#[test]
fn test_cli_ls_unknown_key() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args(["ls", "nope", "--url", &harness.url_with_token()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing attribute: nope"));
}

#[test]
fn test_cli_show_json() {
    let harness = TestHarness::with_catalog();
    let output = plex_export_cmd()
        .args([
            "show",
            "library",
            "sections",
            "Movies",
            "All Movies",
            "Heat",
            "--json",
            "--url",
            &harness.url_with_token(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["title"], "Heat");
    assert_eq!(json["year"], "1995");
}

#[test]
fn test_cli_show_attribute_is_not_navigable() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args(["show", "friendlyName", "--url", &harness.url_with_token()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is an attribute, not a node"));
}

#[test]
fn test_cli_search() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args([
        "search",
        "batman",
        "library",
        "sections",
        "Movies",
        "--url",
        &harness.url_with_token(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Video"))
    .stdout(predicate::str::contains("Batman"));

    let searched = harness.requests().into_iter().any(|request| {
        request.url.path() == "/library/sections/1/search/"
            && request
                .url
                .query_pairs()
                .any(|(k, v)| k == "query" && v == "batman")
    });
    assert!(searched);
}

#[test]
fn test_cli_image_url_and_data_uri() {
    let harness = TestHarness::with_catalog();
    let path = ["image", "library", "sections", "Movies", "All Movies", "Heat"];

    let mut cmd = plex_export_cmd();
    cmd.args(path)
        .args(["--url", &harness.url_with_token()])
        .assert()
        .success()
        .stdout(predicate::str::contains("/library/metadata/42/thumb/1?X-Plex-Token="));

    let mut cmd = plex_export_cmd();
    cmd.args(path)
        .args(["--data-uri", "--url", &harness.url_with_token()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("data:image/png;base64,"));
}

#[test]
fn test_cli_tree() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args(["tree", "library", "--depth", "2", "--url", &harness.url_with_token()])
        .assert()
        .success()
        .stdout(predicate::str::contains("  Directory Library Sections"))
        .stdout(predicate::str::contains("    MovieDirectory Movies"));
}

#[test]
fn test_cli_config_file() {
    let harness = TestHarness::with_catalog();
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("plex-export.toml");
    fs::write(
        &config_path,
        format!(
            "[server]\nurl = \"{}\"\ntoken = \"{}\"\ntimeout_secs = 5\n",
            harness.url(),
            TOKEN
        ),
    )
    .unwrap();

    let mut cmd = plex_export_cmd();
    cmd.args(["check", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Server: Den"));
}

#[test]
fn test_cli_custom_header_is_sent() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args([
        "ls",
        "--header",
        "X-Plex-Product=exporter",
        "--url",
        &harness.url_with_token(),
    ])
    .assert()
    .success();

    let requests = harness.requests();
    assert!(!requests.is_empty());
    assert!(requests.iter().all(|request| request
        .headers
        .get("x-plex-product")
        .is_some_and(|value| value == "exporter")));
}

#[test]
fn test_cli_invalid_timeout() {
    let mut cmd = plex_export_cmd();
    cmd.args(["ls", "--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout cannot be 0"));
}

#[test]
fn test_cli_huge_timeout_is_rejected() {
    let mut cmd = plex_export_cmd();
    cmd.args(["ls", "--timeout", "18446744073709551615"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout cannot exceed"));
}

#[test]
fn test_cli_show_follows_first_of_many() {
    let harness = TestHarness::with_catalog();
    let mut cmd = plex_export_cmd();
    cmd.args([
        "show",
        "library",
        "sections",
        "Movies",
        "All Movies",
        "Heat",
        "Genre",
        "--url",
        &harness.url_with_token(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("tag: Crime"))
    .stdout(predicate::str::contains("tag: Drama").not());
}
