use anyhow::Result;
use clap::{Parser, Subcommand};

use ptc_demo::data::FeatureRegistry;
use ptc_demo::dispatcher::ToolDispatcher;
use ptc_demo::logging;
use ptc_demo::observability::ObservabilityExtender;

/// Command line access to the feature registry
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the feature group docs as JSON
    Discover {
        /// Only groups whose name contains this text
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the requested features as CSV
    Run {
        #[arg(required = true)]
        feature_names: Vec<String>,
    },
}

fn main() -> Result<()> {
    logging::init("warn");

    let cli = Cli::parse();
    let dispatcher = ToolDispatcher::new(
        FeatureRegistry::with_defaults().with_extender(ObservabilityExtender::new()),
    );

    let output = match cli.command {
        Command::Discover { name } => dispatcher.discover_features(name.as_deref())?,
        Command::Run { feature_names } => dispatcher.run_features(&feature_names)?,
    };
    println!("{}", output);
    Ok(())
}
