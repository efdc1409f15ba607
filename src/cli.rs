use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

/// Layout of the truss definition file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Three `----` separated sections of whitespace separated records.
    Text,
    /// The same records as a JSON document.
    Json,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Solve a pin-jointed truss by the method of joints and check every member for buckling and yielding."
)]
pub struct Cli {
    /// Path to the truss definition.
    #[arg(value_name = "PATH")]
    pub definition: PathBuf,

    /// Format of the definition; inferred from the file extension when omitted.
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Print the results as a JSON document instead of a text report.
    #[arg(long)]
    pub json: bool,

    /// Singular values below this fraction of the largest are ignored by the pseudo-inverse.
    #[arg(long, value_name = "FLOAT", default_value_t = 1.0e-15)]
    pub rcond: f64,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
