use assert_cmd::Command;
use predicates::prelude::*;

/// `trl` with environment overrides that could leak in from the shell removed
fn trl() -> Command {
    let mut cmd = Command::cargo_bin("trl").unwrap();
    cmd.env_remove("TRELLIS_URL").env_remove("TRELLIS_TOKEN");
    cmd
}

#[test]
fn test_cli_help() {
    trl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trellis CLI"))
        .stdout(predicate::str::contains("Command line interface"));
}

#[test]
fn test_cli_version() {
    trl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("trl"));
}

#[test]
fn test_subcommand_help() {
    trl()
        .args(["token", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("mint"));

    trl()
        .args(["health", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Check server health"));
}

#[test]
fn test_token_inspect_text() {
    trl()
        .args(["token", "inspect", "session_usr_alice_k3Jd9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("usr_alice"))
        .stdout(predicate::str::contains("k3Jd9"));
}

#[test]
fn test_token_inspect_splits_on_last_separator() {
    trl()
        .args(["token", "inspect", "session_a_b_c", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"identity_id\": \"a_b\""))
        .stdout(predicate::str::contains("\"session_id\": \"c\""));
}

#[test]
fn test_token_inspect_rejects_malformed() {
    trl()
        .args(["token", "inspect", "token_usr_alice_x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing prefix"));

    trl()
        .args(["token", "inspect", "session_usr_alice_"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty session id"));
}

#[test]
fn test_token_mint() {
    trl()
        .args(["token", "mint", "usr_bob"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^session_usr_bob_[A-Za-z0-9]{16}\n$").unwrap());
}

#[test]
fn test_token_mint_rejects_empty_id() {
    trl()
        .args(["token", "mint", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn test_health_reports_offline_server() {
    // Port 9 (discard) is not expected to run an HTTP server
    trl()
        .args(["--url", "http://127.0.0.1:9", "health", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"offline\""));
}

#[test]
fn test_whoami_requires_token() {
    trl()
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--token"));
}
