//! Drives an external `claude -p` process that performs the whole task itself.

use serde_json::Value;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

pub const CLAUDE_BIN: &str = "claude";

/// Captured result of one process run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct ClaudeCli {
    program: String,
    leading_args: Vec<String>,
}

impl Default for ClaudeCli {
    fn default() -> Self {
        Self::new(CLAUDE_BIN)
    }
}

impl ClaudeCli {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before the `-p` flags, e.g. for launchers like `npx`
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn args(&self, allowed_tools: &str) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend(["-p", "--output-format", "json"].map(String::from));
        if !allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(allowed_tools.to_string());
        }
        args
    }

    /// Run one non-interactive invocation with `prompt` on stdin and return
    /// its result text. Failures come back as diagnostic text, never as errors.
    pub async fn run(&self, prompt: &str, allowed_tools: &str) -> String {
        info!(program = %self.program, allowed_tools, "invoking external agent");
        match self.execute(prompt, allowed_tools).await {
            Ok(output) => interpret_output(&output),
            Err(e) => format!("[claude -p failed to start ({})]: {}", self.program, e),
        }
    }

    async fn execute(&self, prompt: &str, allowed_tools: &str) -> std::io::Result<ProcessOutput> {
        let mut child = Command::new(&self.program)
            .args(self.args(allowed_tools))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = prompt.to_string();
            tokio::spawn(async move {
                stdin.write_all(prompt.as_bytes()).await?;
                stdin.shutdown().await
            })
        });

        let output = child.wait_with_output().await?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Err(e)) => warn!("could not write prompt to external agent: {}", e),
                Err(e) => warn!("prompt writer task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }

        Ok(ProcessOutput {
            return_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Turn captured output into report text: a diagnostic on nonzero exit,
/// otherwise the `result` field of the JSON document, or the raw stdout when
/// it is not such a document.
pub fn interpret_output(output: &ProcessOutput) -> String {
    if output.return_code != 0 {
        return format!(
            "[claude -p failed (exit {})]: {}",
            output.return_code, output.stderr
        );
    }

    match serde_json::from_str::<Value>(&output.stdout) {
        Ok(document) => match document.get("result") {
            Some(Value::String(result)) => result.clone(),
            Some(other) => other.to_string(),
            None => output.stdout.clone(),
        },
        Err(_) => output.stdout.clone(),
    }
}
