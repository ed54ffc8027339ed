//! CLI argument definitions using clap.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser, ValueEnum};

/// Output format for the stats report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Single-dash spellings accepted for compatibility with older scripts.
const LEGACY_FLAGS: &[(&str, &str)] = &[
    ("-stats", "--stats"),
    ("-help", "--help"),
    ("-delaytime", "--delaytime"),
];

#[derive(Debug, Parser)]
#[command(name = "flowlog")]
#[command(
    author,
    version,
    about = "Log dispenser durations from a serial device and report daily usage",
    long_about = None,
    disable_help_flag = true
)]
#[command(group(ArgGroup::new("mode").args(["stats", "delaytime", "send"])))]
pub struct Cli {
    /// Print help (also -help, --h)
    #[arg(short = 'h', long, visible_alias = "h", action = ArgAction::Help)]
    #[allow(dead_code)]
    pub help: Option<bool>,

    /// Display usage stats instead of recording (also -stats, --s)
    #[arg(long, visible_alias = "s")]
    pub stats: bool,

    /// Output format for --stats
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Change the device delay time in seconds; prompts when no value is given
    /// (also -delaytime, --d)
    #[arg(
        long,
        visible_alias = "d",
        value_name = "SECONDS",
        num_args = 0..=1
    )]
    pub delaytime: Option<Option<u32>>,

    /// Write a command to the device verbatim and exit
    #[arg(long, value_name = "COMMAND")]
    pub send: Option<String>,

    /// Serial device path
    #[arg(short = 'D', long, env = "FLOWLOG_DEVICE")]
    pub device: Option<String>,

    /// Stats file path
    #[arg(long, env = "FLOWLOG_FILE")]
    pub file: Option<PathBuf>,

    /// Marker that precedes each bracketed value
    #[arg(short, long)]
    pub marker: Option<String>,

    /// File the delay time is written to
    #[arg(long, value_name = "PATH")]
    pub delay_file: Option<PathBuf>,

    /// Stop recording after this many records
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub count: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Record,
    Stats,
    Delay(Option<u32>),
    Send(String),
}

impl Cli {
    /// Parse the process arguments, accepting the legacy single-dash flags.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_legacy_args(std::env::args_os()))
    }

    pub fn mode(&self) -> Mode {
        if self.stats {
            Mode::Stats
        } else if let Some(seconds) = self.delaytime {
            Mode::Delay(seconds)
        } else if let Some(command) = &self.send {
            Mode::Send(command.clone())
        } else {
            Mode::Record
        }
    }
}

/// Rewrite `-stats`, `-help` and `-delaytime` to their double-dash forms.
///
/// The first element (the program name) is passed through untouched, as is
/// everything after a `--` separator.
pub fn normalize_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for (index, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if index == 0 || passthrough {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let replacement = arg.to_str().and_then(|s| {
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| *legacy == s)
                .map(|(_, modern)| OsString::from(*modern))
        });
        out.push(replacement.unwrap_or(arg));
    }
    out
}
