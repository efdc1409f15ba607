mod cli;
mod logging;
mod report;

use std::error::Error;
use std::fs;

use clap::Parser;
use pinjoint::{SolverOptions, TrussDefinition};
use tracing::{debug, info};

use cli::{Cli, InputFormat};
use report::render_report;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet)?;
    debug!("arguments: {:?}", cli);

    // Read the records first so format problems are reported before any
    // structural validation happens.
    let definition = match cli.format {
        None => TrussDefinition::from_path(&cli.definition)?,
        Some(InputFormat::Text) => {
            TrussDefinition::parse_text(&fs::read_to_string(&cli.definition)?)?
        }
        Some(InputFormat::Json) => {
            TrussDefinition::from_json(&fs::read_to_string(&cli.definition)?)?
        }
    };

    // Build the joints and members, then solve the equilibrium equations and
    // check every member against its critical load.
    let truss = definition.build()?;
    info!(
        joints = truss.joint_count(),
        members = truss.member_count(),
        "loaded {}",
        cli.definition.display()
    );
    let options = SolverOptions { rcond: cli.rcond };
    let analysis = truss.solve_with(&options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analysis.report())?);
    } else {
        print!("{}", render_report(&analysis));
    }

    Ok(())
}
