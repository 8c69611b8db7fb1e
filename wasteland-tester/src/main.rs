mod reports;
mod sweep;
mod util;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use sweep::{RegionReport, run_sweep};
use util::{parse_seeds, split_csv};
use wasteland_engine::{Catalogs, EmbeddedLoader, WorldEngine, WorldState, WorldStorage};

#[derive(Debug, Parser)]
#[command(name = "wasteland-tester", version = "0.1.0")]
#[command(about = "Seeded encounter sweeps and invariant checks for the wasteland engine")]
struct Args {
    /// Regions to sweep (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    regions: String,

    /// List all catalog regions and exit
    #[arg(long)]
    list_regions: bool,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Ticks per seed
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Print every encounter as it is rolled
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

/// The tester never persists; sessions are thrown away after each seed.
struct NoStorage;

impl WorldStorage for NoStorage {
    type Error = std::io::Error;

    fn save_state(&self, _save_name: &str, _state: &WorldState) -> Result<(), Self::Error> {
        Ok(())
    }

    fn load_state(&self, _save_name: &str) -> Result<Option<WorldState>, Self::Error> {
        Ok(None)
    }

    fn delete_state(&self, _save_name: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let engine = WorldEngine::new(EmbeddedLoader, NoStorage);
    let catalogs = engine.load_catalogs()?;

    if maybe_list_regions(&args, &catalogs)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let regions = expand_regions(&args.regions, &catalogs)?;
    let seeds = parse_seeds(&args.seeds)?;
    if seeds.is_empty() {
        bail!("no seeds given");
    }

    println!(
        "🧭 Sweeping {} regions x {} seeds x {} ticks",
        regions.len(),
        seeds.len(),
        args.ticks
    );
    let reports = run_sweep(&catalogs, &regions, &seeds, args.ticks, args.verbose);

    write_reports(&args, &reports, start_time)?;

    if reports.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_regions(args: &Args, catalogs: &Catalogs) -> Result<bool> {
    if !args.list_regions {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available regions:")?;
    for region in catalogs.regions.iter() {
        writeln!(
            output_target.writer(),
            "  {:25} - {} (threat {:.2})",
            region.id,
            region.name,
            region.threat
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "☢️  Wasteland Encounter Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

fn expand_regions(regions_arg: &str, catalogs: &Catalogs) -> Result<Vec<String>> {
    let mut regions = split_csv(regions_arg);
    if regions.contains(&"all".to_string()) {
        regions.retain(|r| r != "all");
        regions.extend(catalogs.regions.ids().map(str::to_string));
    }
    let mut seen = Vec::with_capacity(regions.len());
    for region in regions {
        if catalogs.regions.get(&region).is_none() {
            bail!("unknown region `{region}` (see --list-regions)");
        }
        if !seen.contains(&region) {
            seen.push(region);
        }
    }
    Ok(seen)
}

fn write_reports(args: &Args, reports: &[RegionReport], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, reports)?,
        "markdown" => reports::generate_markdown_report(&mut output_target, reports)?,
        _ => {
            reports::generate_console_report(&mut output_target, reports, start_time.elapsed())?;
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
