//! dsvnfilter — rewrites a Subversion dump stream to contain only a
//! caller-selected subset of repository paths.
//!
//! This binary is the thin wrapper §1 keeps out of core: argument
//! parsing, the path-list file, the `svnlook`-shelling repository probe,
//! and logging. All the semantics live in `dsvnfilter-core`.

mod pathfile;
mod probe_external;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dsvnfilter_core::{Driver, FilterConfig, FilterError, MatchModeConfig, RepositoryProbe, ScanDriver};
use probe_external::{NullProbe, SvnlookProbe};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "dsvnfilter")]
#[command(author = "DSvn Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Rewrite a Subversion dump stream to a caller-selected subset of paths")]
struct Cli {
    /// Input dump file, or "-" for standard input.
    input_dump: String,

    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    opts: SharedOpts,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Keep only the given path prefixes.
    Include { paths: Vec<String> },
    /// Drop the given path prefixes, keeping everything else.
    Exclude { paths: Vec<String> },
}

#[derive(Args, Debug)]
struct SharedOpts {
    /// Repository root the external probe consults for untangled content.
    #[arg(short = 'r', long)]
    repo: Option<PathBuf>,

    /// Output path; defaults to standard output.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Preserve empty revisions instead of dropping them.
    #[arg(short = 'k', long = "preserve-empty")]
    preserve_empty: bool,

    /// Keep input revision numbers verbatim in the output.
    #[arg(short = 's', long = "stop-renumbering")]
    stop_renumbering: bool,

    /// Strip svn:mergeinfo properties from emitted nodes.
    #[arg(short = 'x', long = "strip-mergeinfo")]
    strip_mergeinfo: bool,

    /// Read additional path prefixes from a file, one per line.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Report untangle findings instead of emitting a rewritten dump.
    #[arg(long)]
    scan: bool,

    /// Begin emitting at this input revision; earlier revisions are parsed
    /// only to populate the renumber map and emitted-directories set.
    #[arg(long = "start-revision", default_value_t = 0)]
    start_revision: u64,

    /// Reduce logging verbosity to warnings only.
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { tracing::Level::WARN } else { tracing::Level::INFO };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into());
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    tracing_subscriber::registry().with(fmt_layer).with(env_filter).init();
}

fn build_config(cli: &Cli) -> Result<FilterConfig> {
    let (mode, mut prefixes) = match &cli.command {
        Commands::Include { paths } => (MatchModeConfig::Include, paths.clone()),
        Commands::Exclude { paths } => (MatchModeConfig::Exclude, paths.clone()),
    };
    if let Some(file) = &cli.opts.file {
        prefixes.extend(pathfile::read_paths(file)?);
    }

    let config = FilterConfig {
        mode,
        prefixes,
        preserve_empty: cli.opts.preserve_empty,
        stop_renumbering: cli.opts.stop_renumbering,
        strip_mergeinfo: cli.opts.strip_mergeinfo,
        start_revision: cli.opts.start_revision,
    };
    config.validate()?;
    Ok(config)
}

fn open_input(input_dump: &str) -> Result<Box<dyn Read>> {
    if input_dump == "-" {
        Ok(Box::new(std::io::stdin()))
    } else {
        let file = File::open(input_dump).with_context(|| format!("opening input dump {input_dump}"))?;
        Ok(Box::new(file))
    }
}

fn open_output(output: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    match output {
        None => Ok(Box::new(std::io::stdout())),
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating output {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;

    let input = open_input(&cli.input_dump)?;
    let parser = dsvnfilter_core::DumpParser::new(input);

    if cli.opts.scan {
        let scanner = ScanDriver::new(&config);
        let findings = scanner.run(parser)?;
        for finding in &findings {
            println!("{finding}");
        }
        tracing::info!(count = findings.len(), "scan complete");
        return Ok(());
    }

    let mut svnlook_probe;
    let mut null_probe;
    let probe: &mut dyn RepositoryProbe = match cli.opts.repo.clone() {
        Some(repo) => {
            svnlook_probe = SvnlookProbe::new(repo);
            &mut svnlook_probe
        }
        None => {
            null_probe = NullProbe;
            &mut null_probe
        }
    };
    let driver = Driver::new(&config, probe);
    let mut out = open_output(&cli.opts.output)?;
    driver.run(parser, &mut out)?;
    out.flush().context("flushing output")?;
    Ok(())
}

/// 0 on success; otherwise §7's exit-code split: 2 for a `ConfigError`
/// (caught before any streaming begins), 1 for every other fatal error.
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.opts.quiet);

    if let Err(err) = run(&cli) {
        tracing::error!("{err:#}");
        let code = match err.downcast_ref::<FilterError>() {
            Some(FilterError::ConfigError(_)) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}
