// ABOUTME: End-to-end tests of the run pipeline against a mock HTTP server and real files.
// ABOUTME: Checks which outputs are written, and that failures before extraction write nothing.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bookshelf_scrape::{
    load_builtin_profile, run, Fetch, FetchResult, FieldSpec, FileSink, MemorySink, OutputPlan,
    RecordFormat, ScrapeError, Scraper,
};
use httpmock::prelude::*;
use tempfile::TempDir;

const PAGE: &str = r#"<html><head><meta charset="utf-8"></head><body>
<a class="product-card__picture product-card__row" href="/product/1">x</a>
<div class="product-title__head">Vinland Saga</div>
<div class="product-title__author">Makoto Yukimura</div>
<div class="product-price__value product-price__value--discount">1 050 ₽</div>
<a class="product-card__picture product-card__row" href="/product/2">x</a>
<div class="product-title__head">Dorohedoro</div>
<div class="product-title__author">Q Hayashida</div>
</body></html>"#;

fn catalog_scraper() -> Scraper {
    Scraper::builder()
        .fields(load_builtin_profile().fields)
        .build()
        .unwrap()
}

#[derive(Clone, Default)]
struct CountingFetcher {
    calls: Arc<AtomicUsize>,
}

impl Fetch for CountingFetcher {
    fn fetch(&self, url: &str) -> Result<FetchResult, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ScrapeError::transport(url, "Fetch", None))
    }
}

#[test]
fn http_error_reports_transport_and_writes_nothing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/catalog");
        then.status(500).body("internal error");
    });

    let sink = MemorySink::new();
    let err = run(
        &catalog_scraper(),
        &server.url("/catalog"),
        &OutputPlan::default(),
        &sink,
    )
    .unwrap_err();

    assert!(err.is_transport());
    assert!(err.to_string().contains("500"));
    assert!(sink.is_empty());
}

#[test]
fn invalid_selector_fails_before_any_fetch() {
    let fetcher = CountingFetcher::default();
    let err = Scraper::builder()
        .field(FieldSpec::text("title", "//div[@class='product-title__head']"))
        .field(FieldSpec::text("price", "//div[@class='unterminated]"))
        .fetcher(fetcher.clone())
        .build()
        .unwrap_err();

    assert!(err.is_selector());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn successful_run_writes_every_output() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/catalog");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(PAGE);
    });

    let dir = TempDir::new().unwrap();
    let sink = FileSink::new(dir.path());
    let plan = OutputPlan {
        fields_dir: Some("fields".to_string()),
        ..Default::default()
    };

    let report = run(&catalog_scraper(), &server.url("/catalog"), &plan, &sink).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.records, 2);

    let records = fs::read_to_string(dir.path().join("books_info.txt")).unwrap();
    assert_eq!(
        records,
        "Title:Vinland SagaAuthor:Makoto YukimuraPrice:1 050 ₽Link:/product/1\n\n\
         Title:DorohedoroAuthor:Q HayashidaLink:/product/2\n\n"
    );

    let prices = fs::read_to_string(dir.path().join("fields/price.txt")).unwrap();
    assert_eq!(prices, "1 050 ₽\n");
    let links = fs::read_to_string(dir.path().join("fields/link.txt")).unwrap();
    assert_eq!(links, "/product/1\n/product/2\n");

    let raw = fs::read(dir.path().join("site_code.txt")).unwrap();
    assert_eq!(raw, PAGE.as_bytes());
}

#[test]
fn json_records_keep_absent_as_null() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/catalog");
        then.status(200).body(PAGE);
    });

    let sink = MemorySink::new();
    let plan = OutputPlan {
        records: Some("books.json".to_string()),
        record_format: RecordFormat::Json,
        raw: None,
        ..Default::default()
    };

    run(&catalog_scraper(), &server.url("/catalog"), &plan, &sink).unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&sink.get("books.json").unwrap()).unwrap();
    assert_eq!(json[0]["title"], "Vinland Saga");
    assert!(json[1]["price"].is_null());
    assert_eq!(sink.destinations(), vec!["books.json"]);
}

#[test]
fn empty_catalog_page_is_a_successful_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/catalog");
        then.status(200).body("<html><body><h1>Nothing here</h1></body></html>");
    });

    let dir = TempDir::new().unwrap();
    let sink = FileSink::new(dir.path());
    let report = run(
        &catalog_scraper(),
        &server.url("/catalog"),
        &OutputPlan::default(),
        &sink,
    )
    .unwrap();

    assert_eq!(report.records, 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("books_info.txt")).unwrap(),
        ""
    );
    assert!(dir.path().join("site_code.txt").exists());
}
