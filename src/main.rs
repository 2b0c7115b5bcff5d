use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pav_merger::{
    build_exclusions, run, MergeConfig, DEFAULT_CONFLICT_PREVIEW, DEFAULT_KEY_COLUMN,
    DEFAULT_OUTPUT, DEFAULT_SHEET,
};

#[derive(Parser)]
#[command(name = "pav-merger", version)]
#[command(about = "Merge PAV (Physical Asset Verification) sheets from multiple Excel files")]
#[command(after_help = "Examples:
  # Merge two files
  pav-merger \"Anshu K.xlsx\" \"Rohil Kohli.xlsx\"

  # Merge with custom output name
  pav-merger file1.xlsx file2.xlsx -o final_pav.xlsx

  # Merge multiple files
  pav-merger file1.xlsx file2.xlsx file3.xlsx")]
struct Args {
    /// Excel files to merge, oldest first (later files win conflicts)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output file name
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Column to use as unique identifier
    #[arg(short, long, default_value = DEFAULT_KEY_COLUMN)]
    key: String,

    /// Sheet to read from every input and write to the output
    #[arg(short, long, default_value = DEFAULT_SHEET)]
    sheet: String,

    /// Extra placeholder-column pattern (regex), never merged
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// Do not skip the built-in __EMPTY placeholder columns
    #[arg(long)]
    no_default_exclusions: bool,

    /// Also write the merge report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Number of conflicts shown in detail
    #[arg(long, default_value_t = DEFAULT_CONFLICT_PREVIEW)]
    conflicts: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    println!("PAV Sheet Merger");
    println!("{}", "=".repeat(60));

    let config = config_from_args(args)?;
    let report = run(&config)?;

    println!("\n{}", report.render(config.conflict_preview));
    println!("\n✓ Merge completed successfully!");

    Ok(())
}

fn config_from_args(args: Args) -> Result<MergeConfig> {
    let exclusions = build_exclusions(&args.exclude, !args.no_default_exclusions)?;

    let mut config = MergeConfig::new(args.files)
        .with_output(args.output)
        .with_key_column(&args.key)
        .with_sheet(&args.sheet)
        .with_exclusions(exclusions);
    config.conflict_preview = args.conflicts;
    if let Some(path) = args.report_json {
        config = config.with_report_json(path);
    }

    Ok(config)
}
