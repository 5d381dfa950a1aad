//! End-to-end CLI tests for the dazai binary.

use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dazai(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dazai").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .env_remove("Local_Storage")
        .env_remove("Download_url");
    cmd
}

async fn serve(server: &MockServer, path_str: &str, status: u16, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("dazai").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("add"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("dazai").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dazai"));
}

#[test]
fn test_no_subcommand_prints_usage_and_exits_one() {
    let workdir = TempDir::new().unwrap();
    dazai(&workdir)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_unknown_subcommand_lists_commands() {
    let workdir = TempDir::new().unwrap();
    dazai(&workdir)
        .arg("fetch")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Available commands: get, add, env"));
}

#[test]
fn test_get_without_url_exits_two() {
    let workdir = TempDir::new().unwrap();
    dazai(&workdir)
        .arg("get")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("-u"));
}

#[test]
fn test_add_without_urls_exits_one() {
    let workdir = TempDir::new().unwrap();
    dazai(&workdir)
        .arg("add")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No URLs provided"));
}

#[test]
fn test_add_without_all_flag_exits_two() {
    let workdir = TempDir::new().unwrap();
    dazai(&workdir)
        .args(["add", "https://example.com/a"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("--all"));
}

#[test]
fn test_concurrency_out_of_range_is_rejected() {
    let workdir = TempDir::new().unwrap();
    dazai(&workdir)
        .args(["add", "-c", "0", "--all", "https://example.com/a"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_saves_under_prompted_name() {
    let server = MockServer::start().await;
    serve(&server, "/report", 200, b"quarterly numbers").await;
    let workdir = TempDir::new().unwrap();

    dazai(&workdir)
        .args(["get", "-u", &format!("{}/report", server.uri())])
        .write_stdin("numbers.txt\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("as: "))
        .stdout(predicate::str::contains("Download completed"));

    assert_eq!(
        std::fs::read(workdir.path().join("numbers.txt")).unwrap(),
        b"quarterly numbers"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_with_closed_stdin_is_fatal() {
    let server = MockServer::start().await;
    serve(&server, "/report", 200, b"body").await;
    let workdir = TempDir::new().unwrap();

    dazai(&workdir)
        .args(["get", "-u", &format!("{}/report", server.uri())])
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_http_error_exits_one() {
    let server = MockServer::start().await;
    serve(&server, "/gone", 404, b"").await;
    let workdir = TempDir::new().unwrap();

    dazai(&workdir)
        .args(["get", "--name-from-url", "-u", &format!("{}/gone", server.uri())])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("404"));
    assert!(!workdir.path().join("gone").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_timeout_exits_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let workdir = TempDir::new().unwrap();

    dazai(&workdir)
        .args([
            "get",
            "--name-from-url",
            "-t",
            "1",
            "-u",
            &format!("{}/slow", server.uri()),
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timeout downloading"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_partial_failure_exits_three() {
    let server = MockServer::start().await;
    serve(&server, "/one.bin", 200, b"first").await;
    serve(&server, "/two.bin", 200, b"second").await;
    serve(&server, "/three.bin", 404, b"").await;
    let workdir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let uri = server.uri();

    dazai(&workdir)
        .args(["add", "--name-from-url", "-c", "2", "-o"])
        .arg(out_dir.path())
        .arg("--all")
        .args([
            format!("{uri}/one.bin"),
            format!("{uri}/two.bin"),
            format!("{uri}/three.bin"),
        ])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Starting....."))
        .stdout(predicate::str::contains("2 succeeded, 1 failed"));

    assert_eq!(std::fs::read(out_dir.path().join("one.bin")).unwrap(), b"first");
    assert_eq!(std::fs::read(out_dir.path().join("two.bin")).unwrap(), b"second");
    assert!(!out_dir.path().join("three.bin").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_all_succeeded_exits_zero() {
    let server = MockServer::start().await;
    serve(&server, "/a.txt", 200, b"a").await;
    serve(&server, "/b.txt", 200, b"b").await;
    let workdir = TempDir::new().unwrap();
    let uri = server.uri();

    dazai(&workdir)
        .args(["add", "--name-from-url", "--all"])
        .args([format!("{uri}/a.txt"), format!("{uri}/b.txt")])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 succeeded, 0 failed"));

    assert!(workdir.path().join("a.txt").exists());
    assert!(workdir.path().join("b.txt").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_prompts_once_per_target_in_turn() {
    let server = MockServer::start().await;
    serve(&server, "/first", 200, b"first body").await;
    serve(&server, "/second", 200, b"second body").await;
    let workdir = TempDir::new().unwrap();
    let uri = server.uri();

    let output = dazai(&workdir)
        .args(["add", "-c", "2", "--all"])
        .args([format!("{uri}/first"), format!("{uri}/second")])
        .write_stdin("a.bin\nb.bin\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 succeeded, 0 failed"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    assert_eq!(stdout.matches(" as: ").count(), 2, "stdout: {stdout}");
    let mut saved = vec![
        std::fs::read(workdir.path().join("a.bin")).unwrap(),
        std::fs::read(workdir.path().join("b.bin")).unwrap(),
    ];
    saved.sort();
    assert_eq!(saved, vec![b"first body".to_vec(), b"second body".to_vec()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_all_failed_exits_one() {
    let server = MockServer::start().await;
    serve(&server, "/x", 500, b"").await;
    let workdir = TempDir::new().unwrap();
    let uri = server.uri();

    dazai(&workdir)
        .args(["add", "--name-from-url", "--all"])
        .args([format!("{uri}/x"), "not a url".to_string()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("0 succeeded, 2 failed"));
}

#[test]
fn test_add_missing_output_dir_is_fatal() {
    let workdir = TempDir::new().unwrap();
    dazai(&workdir)
        .args(["add", "--name-from-url", "-o"])
        .arg(workdir.path().join("does-not-exist"))
        .args(["--all", "https://example.com/a"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("download directory is not usable"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_env_downloads_into_created_storage_dir() {
    let server = MockServer::start().await;
    serve(&server, "/env.bin", 200, b"from the environment").await;
    let workdir = TempDir::new().unwrap();
    let storage = workdir.path().join("storage").join("nested");

    dazai(&workdir)
        .arg("env")
        .env("Local_Storage", &storage)
        .env("Download_url", format!("{}/env.bin", server.uri()))
        .write_stdin("saved.bin\n")
        .assert()
        .success();

    assert_eq!(
        std::fs::read(storage.join("saved.bin")).unwrap(),
        b"from the environment"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_env_reads_dotenv_file() {
    let server = MockServer::start().await;
    serve(&server, "/dot.bin", 200, b"dotenv").await;
    let workdir = TempDir::new().unwrap();
    std::fs::write(
        workdir.path().join(".env"),
        format!("Local_Storage=files\nDownload_url={}/dot.bin\n", server.uri()),
    )
    .unwrap();

    dazai(&workdir)
        .args(["env", "--name-from-url"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read(workdir.path().join("files").join("dot.bin")).unwrap(),
        b"dotenv"
    );
}

#[test]
fn test_env_without_variables_is_fatal() {
    let workdir = TempDir::new().unwrap();
    dazai(&workdir)
        .arg("env")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Local_Storage"));
}
