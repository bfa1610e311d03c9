use anyhow::{Context, Result};
use bat::PrettyPrinter;
use clap::Parser;
use console::{style, Term};
use std::env;
use std::path::PathBuf;

use ptc_demo::approaches::{Approach, Runner, Settings};
use ptc_demo::claude_cli::{ClaudeCli, CLAUDE_BIN};
use ptc_demo::logging;
use ptc_demo::providers::configs::{
    AnthropicProviderConfig, ProviderConfig, ANTHROPIC_HOST, ANTHROPIC_MODEL,
};

const DELIMITER_WIDTH: usize = 60;
const FEATURES_BIN: &str = "ptc-features";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Approach to run; runs loop, bash and ptc in that order when omitted
    #[arg(value_enum)]
    approach: Option<Approach>,

    /// Anthropic API key (can also be set via ANTHROPIC_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Model to use (can also be set via ANTHROPIC_MODEL environment variable)
    #[arg(short, long)]
    model: Option<String>,

    /// Program used for the bash approach (defaults to PTC_DEMO_CLAUDE_BIN or `claude`)
    #[arg(long)]
    claude_bin: Option<String>,

    /// Feature CLI the external agent runs (defaults to PTC_DEMO_FEATURES_BIN
    /// or the ptc-features binary next to this one)
    #[arg(long)]
    features_bin: Option<String>,

    /// Print reports as plain text even on a terminal
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init("info");

    let cli = Cli::parse();
    let settings = settings(&cli)?;
    let runner = Runner::new(settings);

    let approaches = match cli.approach {
        Some(approach) => vec![approach],
        None => Approach::ALL.to_vec(),
    };

    let pretty = !cli.plain && Term::stdout().is_term();
    for approach in approaches {
        let report = runner.run(approach).await?;

        let delimiter = "=".repeat(DELIMITER_WIDTH);
        println!();
        println!("{}", delimiter);
        println!("  {}", style(approach.label()).bold());
        println!("{}", delimiter);
        if pretty {
            render(&report)?;
            println!();
        } else {
            println!("{}", report);
        }
    }
    Ok(())
}

fn settings(cli: &Cli) -> Result<Settings> {
    // Loop and ptc report a missing key when they run, so bash works without one.
    let anthropic = match &cli.api_key {
        Some(api_key) => {
            let host = AnthropicProviderConfig::get_env(
                "ANTHROPIC_HOST",
                false,
                Some(ANTHROPIC_HOST.to_string()),
            )?
            .context("Anthropic host should be present")?;
            let model = AnthropicProviderConfig::get_env(
                "ANTHROPIC_MODEL",
                false,
                Some(ANTHROPIC_MODEL.to_string()),
            )?
            .context("Anthropic model should be present")?;
            Some(AnthropicProviderConfig::new(api_key.clone(), host, model))
        }
        None => AnthropicProviderConfig::from_env().ok(),
    }
    .map(|config| match &cli.model {
        Some(model) => AnthropicProviderConfig {
            model: model.clone(),
            ..config
        },
        None => config,
    });

    let claude_bin = cli
        .claude_bin
        .clone()
        .or_else(|| env::var("PTC_DEMO_CLAUDE_BIN").ok())
        .unwrap_or_else(|| CLAUDE_BIN.to_string());

    let features_command = match cli
        .features_bin
        .clone()
        .or_else(|| env::var("PTC_DEMO_FEATURES_BIN").ok())
    {
        Some(command) => command,
        None => sibling_features_bin()?.display().to_string(),
    };

    Ok(Settings {
        anthropic,
        claude: ClaudeCli::new(claude_bin),
        features_command,
    })
}

/// The ptc-features binary installed next to the running executable
fn sibling_features_bin() -> Result<PathBuf> {
    let exe = env::current_exe().context("Could not locate the running executable")?;
    let dir = exe
        .parent()
        .context("Running executable has no parent directory")?;
    Ok(dir.join(format!("{}{}", FEATURES_BIN, env::consts::EXE_SUFFIX)))
}

fn render(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .context("Could not render report")?;
    Ok(())
}
