//! The three ways of connecting the model to the feature registry.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::agent::Agent;
use crate::claude_cli::ClaudeCli;
use crate::data::employees::EMPLOYEE_FEATURES;
use crate::data::FeatureRegistry;
use crate::dispatcher::ToolDispatcher;
use crate::observability::ObservabilityExtender;
use crate::prompt_template::load_prompt_file;
use crate::providers::anthropic::AnthropicProvider;
use crate::providers::base::Provider;
use crate::providers::configs::AnthropicProviderConfig;

pub const QUESTIONS: [&str; 3] = [
    "(a) Who are the top 3 highest-paid employees? (employee_id, department, salary)",
    "(b) What is the average salary per department?",
    "(c) Which employees have a performance_score > 90? (employee_id, department, performance_score)",
];

pub const LOOP_MAX_TOKENS: i32 = 4096;
pub const PTC_MAX_TOKENS: i32 = 16384;
pub const CODE_EXECUTION_TYPE: &str = "code_execution_20260120";
pub const CODE_EXECUTION_NAME: &str = "code_execution";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Approach {
    /// Messages API with a local tool-calling loop
    Loop,
    /// One `claude -p` run that fetches the data through Bash
    Bash,
    /// Messages API with tools called from a code-execution sandbox
    Ptc,
}

impl Approach {
    pub const ALL: [Approach; 3] = [Approach::Loop, Approach::Bash, Approach::Ptc];

    pub fn label(&self) -> &'static str {
        match self {
            Approach::Loop => "LoopApproach",
            Approach::Bash => "BashApproach",
            Approach::Ptc => "PtcApproach",
        }
    }
}

#[derive(Serialize)]
struct PromptContext<'a> {
    questions: &'a [&'a str],
    features: &'a [&'a str],
    features_command: &'a str,
}

/// Everything the approaches need from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Messages API configuration; only the loop and ptc approaches need it
    pub anthropic: Option<AnthropicProviderConfig>,
    pub claude: ClaudeCli,
    /// Command the external agent runs to reach the feature registry
    pub features_command: String,
}

pub struct Runner {
    settings: Settings,
}

impl Runner {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Run one approach and return its report
    pub async fn run(&self, approach: Approach) -> Result<String> {
        let span = info_span!("approach", name = approach.label(), run_id = %Uuid::new_v4());
        let extender = ObservabilityExtender::named(approach.label());

        extender
            .call_async(self.dispatch(approach))
            .instrument(span)
            .await
    }

    async fn dispatch(&self, approach: Approach) -> Result<String> {
        info!("starting");
        match approach {
            Approach::Loop => {
                let provider = self.provider(approach, LOOP_MAX_TOKENS)?;
                run_loop(Box::new(provider), registry()).await
            }
            Approach::Bash => {
                Ok(run_bash(&self.settings.claude, &self.settings.features_command).await)
            }
            Approach::Ptc => {
                let provider = self.provider(approach, PTC_MAX_TOKENS)?;
                run_ptc(Box::new(provider), registry()).await
            }
        }
    }

    fn provider(&self, approach: Approach, max_tokens: i32) -> Result<AnthropicProvider> {
        let config = self.settings.anthropic.clone().ok_or_else(|| {
            anyhow!(
                "{} needs an Anthropic API key (--api-key or ANTHROPIC_API_KEY)",
                approach.label()
            )
        })?;
        AnthropicProvider::new(config.with_max_tokens(max_tokens))
    }
}

fn registry() -> FeatureRegistry {
    FeatureRegistry::with_defaults().with_extender(ObservabilityExtender::new())
}

fn render(template: &str, features_command: &str) -> Result<String> {
    let context = PromptContext {
        questions: &QUESTIONS,
        features: &EMPLOYEE_FEATURES,
        features_command,
    };
    load_prompt_file(template, &context).with_context(|| format!("rendering {}", template))
}

/// Model calls `discover_features` / `run_features` directly; this process
/// dispatches each call.
pub async fn run_loop(provider: Box<dyn Provider>, registry: FeatureRegistry) -> Result<String> {
    let prompt = render("loop.md", "")?;
    let agent = Agent::new(provider, Box::new(ToolDispatcher::new(registry)));
    agent.reply(&prompt).await
}

/// Model writes code in a provider sandbox that calls the tools; each call
/// pauses the sandbox until this process returns the result.
pub async fn run_ptc(provider: Box<dyn Provider>, registry: FeatureRegistry) -> Result<String> {
    let prompt = render("ptc.md", "")?;
    let agent = Agent::new(provider, Box::new(ToolDispatcher::new(registry)))
        .with_code_execution(CODE_EXECUTION_TYPE, CODE_EXECUTION_NAME);
    agent.reply(&prompt).await
}

/// The external agent does everything itself using Bash.
pub async fn run_bash(claude: &ClaudeCli, features_command: &str) -> String {
    match render("bash.md", features_command) {
        Ok(prompt) => claude.run(&prompt, "Bash").await,
        Err(e) => format!("[could not build prompt]: {:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let labels: Vec<&str> = Approach::ALL.iter().map(|a| a.label()).collect();
        assert_eq!(labels, vec!["LoopApproach", "BashApproach", "PtcApproach"]);
    }

    #[test]
    fn test_prompts_render() -> Result<()> {
        let prompt = render("ptc.md", "")?;
        assert!(prompt.contains("run_features(feature_names=[...])"));
        assert!(prompt.ends_with(QUESTIONS[2]));

        let prompt = render("bash.md", "ptc-features")?;
        assert!(prompt.contains(
            "ptc-features run employee_id department salary years_experience performance_score"
        ));
        Ok(())
    }

    #[test]
    fn test_settings_debug_hides_api_key() {
        let settings = Settings {
            anthropic: Some(AnthropicProviderConfig::new(
                "sk-ant-secret".to_string(),
                "https://api.anthropic.com".to_string(),
                "claude-sonnet-4-6".to_string(),
            )),
            claude: ClaudeCli::default(),
            features_command: "ptc-features".to_string(),
        };
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("sk-ant-secret"));
        assert!(printed.contains("claude-sonnet-4-6"));
    }

    #[tokio::test]
    async fn test_api_approaches_need_a_key() {
        let runner = Runner::new(Settings {
            anthropic: None,
            claude: ClaudeCli::default(),
            features_command: "ptc-features".to_string(),
        });
        let err = runner.run(Approach::Ptc).await.unwrap_err();
        assert!(err.to_string().contains("PtcApproach needs an Anthropic API key"));
    }
}
