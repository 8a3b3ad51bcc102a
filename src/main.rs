use anyhow::Result;
use clap::Parser;
use patent_heat::{
    config::Config,
    process::{self, tally::Tally},
    report::{self, ReportOptions, SignStyle},
    years,
};
use std::{
    io::{self, Write},
    path::PathBuf,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Year x technology-code heat matrix for high-novelty patent records"
)]
struct Args {
    /// YAML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Patent CSV to read
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Years to analyse; prompts on stdin when omitted
    #[arg(short, long, num_args = 1..)]
    years: Option<Vec<i32>>,

    /// Comma-separated technology codes, e.g. G06K,F41G
    #[arg(long, value_delimiter = ',')]
    codes: Option<Vec<String>>,

    /// Novelty must be strictly above this
    #[arg(long)]
    threshold: Option<f64>,

    /// Always prefix growth with a literal '+', even when negative
    #[arg(long)]
    literal_plus: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging (stderr, so the report owns stdout) ─────────
    let default_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) resolve config ───────────────────────────────────────────
    let mut cfg = match &args.config {
        Some(path) => Config::from_yaml_file(path)?,
        None => Config::default(),
    };
    if let Some(input) = args.input {
        cfg.input = input;
    }
    if let Some(codes) = args.codes {
        cfg.tech_codes = codes;
    }
    if let Some(threshold) = args.threshold {
        cfg.novelty_threshold = threshold;
    }
    if args.literal_plus {
        cfg.sign_style = SignStyle::LiteralPlus;
    }
    info!(input = %cfg.input.display(), codes = ?cfg.tech_codes, "startup");

    // ─── 3) years of interest ────────────────────────────────────────
    let requested = match args.years {
        Some(years) => years,
        None => years::prompt_years(io::stdin().lock(), io::stdout())?,
    };
    info!(years = ?requested, "analysing");

    // ─── 4) single pass over the file ────────────────────────────────
    let mut tally = Tally::new(requested, cfg.tech_codes.clone(), cfg.rules());
    println!("\nProcessing data...\n");
    process::run_file(&cfg.input, &mut tally, cfg.progress_every)?;

    // ─── 5) report ───────────────────────────────────────────────────
    let opts = ReportOptions {
        novelty_threshold: cfg.novelty_threshold,
        observed_limit: cfg.observed_limit,
        sign_style: cfg.sign_style,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_report(&mut out, &tally, &opts)?;
    out.flush()?;

    info!("all done");
    Ok(())
}
