use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use color_print::cformat;
use tracechain::TraceError;
use tracechain::chain::{Chain, ChainSpec, MatchOptions, Pattern, TraceAnalyzer, WildcardMode};
use tracechain::config::ChainConfig;
use tracechain::display::{format_trace, styled_chains};
use tracechain::styling::{ERROR_EMOJI, eprintln, level_style, print};
use tracechain::trace::{ExportOptions, Trace, parse_trace, write_chrome_trace};

mod cli;

use cli::{Cli, Commands, InputArgs, OutputArgs, PatternArgs};

fn read_input(input: &InputArgs) -> Result<String> {
    match input.file.as_deref() {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn load_trace(input: &InputArgs, config: &ChainConfig) -> Result<Trace> {
    let mut trace = parse_trace(&read_input(input)?)?;
    config.apply_names(&mut trace);
    log::debug!("Loaded {} events", trace.len());
    Ok(trace)
}

fn match_options(config: &ChainConfig, args: &PatternArgs) -> MatchOptions {
    let mut options = config.match_options();
    if args.unrestricted {
        options.wildcard = WildcardMode::Unrestricted;
    }
    options
}

/// Chains from the config file first, then the one given on the command line.
fn collect_chains(trace: &Trace, config: &ChainConfig, args: &PatternArgs) -> Result<Vec<Chain>> {
    let mut specs = config.chain_specs()?;
    if let (Some(pattern), Some(label)) = (&args.pattern, &args.label) {
        specs.push(ChainSpec::new(label.as_str(), Pattern::compile(pattern)?));
    }

    let mut analyzer = TraceAnalyzer::with_options(trace, match_options(config, args));
    for (spec, found) in specs.iter().zip(analyzer.match_specs(&specs)) {
        log::debug!("{}: {} chains for {}", spec.label, found.len(), spec.pattern);
    }
    Ok(analyzer.chains().to_vec())
}

fn export_options(config: &ChainConfig, args: &OutputArgs) -> ExportOptions {
    let mut options = config.export_options();
    if let Some(pid) = args.chain_pid {
        options.chain_pid = pid;
    }
    options
}

fn write_json(trace: &Trace, chains: &[Chain], args: &OutputArgs, config: &ChainConfig) -> Result<()> {
    let options = export_options(config, args);
    match &args.output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_chrome_trace(&mut writer, trace, chains, &options)?;
            writer.flush()?;
            log::debug!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_chrome_trace(&mut writer, trace, chains, &options)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = ChainConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Export { input, output } => {
            let trace = load_trace(&input, &config)?;
            write_json(&trace, &[], &output, &config)
        }
        Commands::Match {
            input,
            pattern,
            output,
        } => {
            let trace = load_trace(&input, &config)?;
            let chains = collect_chains(&trace, &config, &pattern)?;
            write_json(&trace, &chains, &output, &config)
        }
        Commands::Show { input, pattern } => {
            let trace = load_trace(&input, &config)?;
            let chains = collect_chains(&trace, &config, &pattern)?;
            if pattern.pattern.is_none() && config.chains.is_empty() {
                print!("{}", format_trace(&trace));
            } else {
                print!("{}", styled_chains(&trace, &chains));
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --verbose flag or RUST_LOG env var
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "off" }),
    )
    .format(|buf, record| {
        let style = level_style(record.level());
        let level = record.level().as_str().to_ascii_lowercase();
        writeln!(buf, "{style}[{level}]{style:#} {}", record.args())
    })
    .init();

    if let Err(e) = run(cli) {
        // Domain errors are already formatted with emoji and colors
        if let Some(err) = e.downcast_ref::<TraceError>() {
            eprintln!("{err}");
        } else {
            eprintln!("{}", cformat!("{ERROR_EMOJI} <red>{e:#}</>"));
        }
        process::exit(1);
    }
}
