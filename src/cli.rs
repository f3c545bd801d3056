use clap::builder::styling::{AnsiColor, Color, Styles};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Custom styles for help output
fn help_styles() -> Styles {
    Styles::styled()
        .header(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .usage(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .placeholder(anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
}

/// Help template for commands
const HELP_TEMPLATE: &str = "\
{before-help}{name} - {about-with-newline}\
Usage: {usage}

{all-args}{after-help}";

#[derive(Parser)]
#[command(name = "tracechain")]
#[command(about = "Find event chains in execution traces", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
#[command(styles = help_styles())]
#[command(help_template = HELP_TEMPLATE)]
#[command(arg_required_else_help = true)]
#[command(after_long_help = r#"Trace input is read from FILE, or stdin when FILE is absent or `-`.
Each event is a line such as:

  [trace] ts=1.5 pid=1 tid=2 ph=B name="receive_request" arg.path="/index"

Open the JSON output in chrome://tracing or https://ui.perfetto.dev"#)]
pub struct Cli {
    /// Config file path
    #[arg(
        long,
        global = true,
        value_name = "path",
        display_order = 101,
        help_heading = "Global Options"
    )]
    pub config: Option<PathBuf>,

    /// Show debug info
    #[arg(
        long,
        short = 'v',
        global = true,
        display_order = 102,
        help_heading = "Global Options"
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Trace log to read (stdin if absent or `-`)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Write JSON here instead of stdout
    #[arg(long, short = 'o', value_name = "path")]
    pub output: Option<PathBuf>,

    /// Process ID for chain records
    #[arg(long, value_name = "pid")]
    pub chain_pid: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct PatternArgs {
    /// Pattern to match, e.g. `request+*request-`
    #[arg(long, short = 'p', requires = "label")]
    pub pattern: Option<String>,

    /// Name for the chains the pattern finds
    #[arg(long, short = 'l', requires = "pattern")]
    pub label: Option<String>,

    /// Let wildcards absorb repeated events
    #[arg(long)]
    pub unrestricted: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a trace log to Chrome Trace Format
    Export {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Match patterns and export the trace with its chains
    #[command(after_long_help = r#"## Patterns

A pattern is a sequence of tokens:

- `name+` matches the begin of duration `name`
- `name-` matches its end
- `*` matches the events in between, stopping at the first event that lets
  the rest of the pattern match. A wildcard never absorbs the same event
  twice unless `--unrestricted` is given.

Chains from every `[[chains]]` entry of the config file are added as well.

```console
tracechain match app.log -p 'receive+*respond-' -l request > trace.json
```"#)]
    Match {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        pattern: PatternArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List events, or matched chains with their events
    Show {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        pattern: PatternArgs,
    },
}
