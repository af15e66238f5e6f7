// ABOUTME: Integration tests for the bookshelf CLI binary.
// ABOUTME: Runs the binary against a mock server and saved pages, checking files and exit status.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const PAGE: &str = r#"<html><body>
<a class="product-card__picture product-card__row" href="/product/7">x</a>
<div class="product-title__head">Blame!</div>
<div class="product-title__author">Tsutomu Nihei</div>
<div class="product-price__value product-price__value--discount">1 490 ₽</div>
</body></html>"#;

fn bookshelf_cmd() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("BOOKSHELF_PROFILE")
        .env_remove("BOOKSHELF_OUT_DIR")
        .env_remove("BOOKSHELF_USER_AGENT");
    cmd
}

#[test]
fn fetch_writes_records_and_raw_page() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/manga");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(PAGE);
    });
    let out = TempDir::new().unwrap();

    bookshelf_cmd()
        .arg(server.url("/manga"))
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s)"));

    assert_eq!(
        fs::read_to_string(out.path().join("books_info.txt")).unwrap(),
        "Title:Blame!Author:Tsutomu NiheiPrice:1 490 ₽Link:/product/7\n\n"
    );
    assert_eq!(
        fs::read_to_string(out.path().join("site_code.txt")).unwrap(),
        PAGE
    );
}

#[test]
fn saved_page_runs_offline() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("page.html");
    fs::write(&page, PAGE).unwrap();

    bookshelf_cmd()
        .arg("--html")
        .arg(&page)
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--no-raw")
        .arg("--fields-dir")
        .arg("fields")
        .assert()
        .success();

    assert!(dir.path().join("books_info.txt").exists());
    assert!(!dir.path().join("site_code.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("fields/author.txt")).unwrap(),
        "Tsutomu Nihei\n"
    );
}

#[test]
fn http_error_fails_without_writing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/manga");
        then.status(503).body("maintenance");
    });
    let out = TempDir::new().unwrap();

    bookshelf_cmd()
        .arg(server.url("/manga"))
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("transport error"));

    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn invalid_profile_selector_fails_before_fetch() {
    let dir = TempDir::new().unwrap();
    let profile = dir.path().join("broken.json");
    fs::write(
        &profile,
        r#"{"name":"broken","fields":[{"name":"title","path":"//div[@class='x'"}]}"#,
    )
    .unwrap();

    bookshelf_cmd()
        .arg("http://127.0.0.1:9/unreachable")
        .arg("--profile")
        .arg(&profile)
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("selector error"));

    assert!(!dir.path().join("books_info.txt").exists());
}

#[test]
fn failed_records_write_still_saves_raw_page() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("page.html");
    fs::write(&page, PAGE).unwrap();
    // A regular file where the records directory should be.
    fs::write(dir.path().join("blocked"), "x").unwrap();

    bookshelf_cmd()
        .arg("--html")
        .arg(&page)
        .arg("--out-dir")
        .arg(dir.path())
        .arg("-o")
        .arg("blocked/books_info.txt")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("I/O error"));

    assert_eq!(
        fs::read_to_string(dir.path().join("site_code.txt")).unwrap(),
        PAGE
    );
}

#[test]
fn check_validates_builtin_profile() {
    bookshelf_cmd()
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("4 field(s) ok"))
        .stdout(predicate::str::contains("link"));
}

#[test]
fn json_format_writes_null_for_missing_price() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("page.html");
    fs::write(
        &page,
        r#"<div class="product-title__head">A</div><div class="product-title__head">B</div>"#,
    )
    .unwrap();

    bookshelf_cmd()
        .arg("--html")
        .arg(&page)
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--format")
        .arg("json")
        .arg("-o")
        .arg("books.json")
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("books.json")).unwrap();
    assert!(text.contains(r#""title": "B""#));
    assert!(text.contains(r#""price": null"#));
}

#[test]
fn empty_saved_page_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("blank.html");
    fs::write(&page, "   \n").unwrap();

    bookshelf_cmd()
        .arg("--html")
        .arg(&page)
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse error"));
}
