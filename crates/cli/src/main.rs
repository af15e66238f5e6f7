// ABOUTME: CLI binary for the bookshelf catalog scraper.
// ABOUTME: Fetches a catalog page (or reads a saved one), writes labeled records, per-field lists, and the raw page.

mod logging;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Result};
use bookshelf_scrape::{
    load_builtin_profile, load_profile, run, run_offline, FileSink, OutputPlan, ParseMode,
    Profile, RecordFormat, RunReport, Scraper,
};
use clap::Parser;
use tracing::{info, warn};

/// Scrape a product catalog page into aligned records.
#[derive(Parser, Debug)]
#[command(name = "bookshelf", version)]
#[command(about = "Extract book records from a catalog page", long_about = None)]
struct Args {
    /// Catalog URL (default: the profile's URL)
    #[arg()]
    url: Option<String>,

    /// JSON field profile (default: the built-in catalog profile)
    #[arg(long, env = "BOOKSHELF_PROFILE")]
    profile: Option<PathBuf>,

    /// Extract from a saved HTML file instead of fetching
    #[arg(long, conflicts_with = "url")]
    html: Option<PathBuf>,

    /// Directory that relative output paths are resolved against
    #[arg(long, env = "BOOKSHELF_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Records output file
    #[arg(short = 'o', long = "output", default_value = "books_info.txt")]
    output: String,

    /// Raw page output file
    #[arg(long, default_value = "site_code.txt")]
    raw_output: String,

    /// Do not save the raw page
    #[arg(long)]
    no_raw: bool,

    /// Also write one <field>.txt per field into this directory
    #[arg(long)]
    fields_dir: Option<String>,

    /// Records format: text or json
    #[arg(long, default_value = "text")]
    format: RecordFormat,

    /// User-Agent header for the request
    #[arg(long, env = "BOOKSHELF_USER_AGENT")]
    user_agent: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Reject pages with malformed markup instead of repairing them
    #[arg(long)]
    strict: bool,

    /// Validate the profile and exit without fetching
    #[arg(long)]
    check: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match execute(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Returns `Ok(false)` when the run finished but some output failed.
fn execute(args: &Args) -> Result<bool> {
    let profile = match &args.profile {
        Some(path) => load_profile(path)?,
        None => load_builtin_profile(),
    };
    info!(profile = %profile.name, fields = profile.fields.len(), "loaded profile");

    let mut builder = Scraper::builder()
        .fields(profile.fields.clone())
        .timeout(Duration::from_secs(args.timeout));
    if let Some(agent) = &args.user_agent {
        builder = builder.user_agent(agent.as_str());
    }
    if args.strict {
        builder = builder.parse_mode(ParseMode::Strict);
    }
    let scraper = builder.build()?;

    if args.check {
        print_check(&profile, &scraper);
        return Ok(true);
    }

    let sink = FileSink::new(&args.out_dir);
    let plan = OutputPlan {
        records: Some(args.output.clone()),
        record_format: args.format,
        fields_dir: args.fields_dir.clone(),
        raw: (!args.no_raw).then(|| args.raw_output.clone()),
    };

    let report = match &args.html {
        Some(path) => {
            let raw = fs::read(path)
                .map_err(|e| anyhow!("failed to read {}: {}", path.display(), e))?;
            run_offline(&scraper, &path.display().to_string(), &raw, &plan, &sink)?
        }
        None => {
            let url = target_url(args, &profile)?;
            run(&scraper, &url, &plan, &sink)?
        }
    };

    Ok(summarize(&report))
}

fn target_url(args: &Args, profile: &Profile) -> Result<String> {
    args.url
        .clone()
        .or_else(|| profile.url.clone())
        .ok_or_else(|| anyhow!("no URL given and profile '{}' has none", profile.name))
}

fn print_check(profile: &Profile, scraper: &Scraper) {
    println!("profile {}: {} field(s) ok", profile.name, scraper.fields().len());
    for field in scraper.fields().iter() {
        println!("  {} <- {}", field.name(), field.expr().css());
    }
}

fn summarize(report: &RunReport) -> bool {
    println!("{} record(s) from {}", report.records, report.url);
    for written in &report.written {
        println!("wrote {}", written);
    }
    for failure in &report.failed {
        eprintln!("error: {}", failure);
    }
    if !report.is_clean() {
        warn!(failed = report.failed.len(), "run finished with failed writes");
    }
    report.is_clean()
}
