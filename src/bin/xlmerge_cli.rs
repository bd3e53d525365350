//! CLI tool for xlmerge - merges source sheets into a main workbook
//!
//! Usage:
//!   xlmerge_cli --main main.xlsx --source converted.xlsx --roster equipment.xlsx
//!   xlmerge_cli --main main.xlsx --source a.xlsx --source b.xlsx --roster r.xlsx \
//!       --config merge.json --output merged.xlsx --report report.json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use xlmerge::{merge, roster, MergeConfig, XlDocument};

#[derive(Parser)]
#[command(version, about = "Fill per-location worksheet sections from source workbooks.")]
struct Args {
    /// Workbook holding one sheet per location.
    #[arg(long = "main", value_name = "XLSX")]
    main: PathBuf,

    /// Workbook holding the source sheets (repeatable, searched in order).
    #[arg(long = "source", value_name = "XLSX", required = true)]
    sources: Vec<PathBuf>,

    /// Workbook holding the equipment roster.
    #[arg(long, value_name = "XLSX")]
    roster: PathBuf,

    /// JSON configuration; built-in defaults when omitted.
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Where to write the merged workbook (default: overwrite --main).
    #[arg(long, short = 'o', value_name = "XLSX")]
    output: Option<PathBuf>,

    /// Write the run report as JSON.
    #[arg(long, value_name = "JSON")]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> xlmerge::Result<()> {
    let config = match &args.config {
        Some(path) => MergeConfig::from_json_file(path)?,
        None => MergeConfig::default(),
    };

    let mut main_doc = XlDocument::open(&args.main)?;
    let sources = args
        .sources
        .iter()
        .map(|path| XlDocument::open(path).map(|doc| doc.workbook().clone()))
        .collect::<xlmerge::Result<Vec<_>>>()?;
    let roster_doc = XlDocument::open(&args.roster)?;
    let records = roster::load_roster(roster_doc.workbook(), &config.roster)?;

    let report = merge::run(&mut main_doc, &sources, &records, &config)?;

    for event in report.events.events() {
        println!("{event}");
    }
    println!();
    for location in &report.locations {
        println!(
            "{:<16} arm A {:<15} arm B {:<15} console {:<15} => {}",
            location.sheet,
            format!("{:?}", location.arm_a),
            format!("{:?}", location.arm_b),
            format!("{:?}", location.console),
            location.status
        );
    }
    let (complete, partial, missing) = report.status_counts();
    println!(
        "{complete} complete, {partial} partial, {missing} missing, {} skipped",
        report.skipped.len()
    );

    let output = args.output.as_ref().unwrap_or(&args.main);
    main_doc.save_to(output)?;
    eprintln!("Written: {}", output.display());

    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)?;
        eprintln!("Report: {}", path.display());
    }
    Ok(())
}
