//! relay-probe: check that a tool server answers an `initialize` request.

mod logging;

use anyhow::Result;
use clap::Parser;
use relay_mcp::{ProbeConfig, ProbeOutcome, ProbeResponse, run_probe};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "relay-probe",
    version,
    about = "Send one initialize request to an MCP server and report its answer"
)]
struct Cli {
    /// Server entry point
    #[arg(default_value = "server.py")]
    server: PathBuf,

    /// Executable that runs the entry point
    #[arg(long)]
    runner: Option<String>,

    /// Argument placed before the entry point (repeatable).
    /// Defaults to `run python` when no runner is given.
    #[arg(long = "runner-arg", allow_hyphen_values = true)]
    runner_args: Vec<String>,

    /// Seconds to wait for the server to exit
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> ProbeConfig {
        let defaults = ProbeConfig::default();
        let runner_args = match (&self.runner, self.runner_args.is_empty()) {
            (_, false) => self.runner_args,
            (Some(_), true) => Vec::new(),
            (None, true) => defaults.runner_args,
        };
        ProbeConfig {
            server: self.server,
            runner: self.runner.unwrap_or(defaults.runner),
            runner_args,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = cli.into_config();

    let outcome = run_probe(&config).await?;
    report(&outcome, &config)?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn report(outcome: &ProbeOutcome, config: &ProbeConfig) -> Result<()> {
    match outcome {
        ProbeOutcome::Exited {
            status,
            stdout,
            stderr,
            response,
        } => {
            println!("=== MCP server probe result ===");
            match status.code() {
                Some(code) => println!("Exit status: {code}"),
                None => println!("Exit status: {status}"),
            }
            println!("Stdout: {stdout}");
            if !stderr.is_empty() {
                println!("Stderr: {stderr}");
            }
            match response {
                ProbeResponse::Valid(value) => {
                    println!("Server response is well-formed JSON");
                    println!("Response: {}", serde_json::to_string_pretty(value)?);
                }
                ProbeResponse::Invalid(reason) => {
                    println!("Server response is not valid JSON: {reason}");
                }
                ProbeResponse::Empty => {
                    println!("Server printed nothing");
                }
            }
        }
        ProbeOutcome::TimedOut { pid } => {
            let pid = pid.map_or_else(|| "unknown".to_string(), |p| p.to_string());
            println!(
                "Server did not exit within {}s (pid {pid}, killed)",
                config.timeout.as_secs()
            );
        }
        ProbeOutcome::NotFound { what } => {
            println!("Could not find {what}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ProbeConfig {
        let mut argv = vec!["relay-probe"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv).into_config()
    }

    #[test]
    fn defaults_run_server_py_with_uv() {
        let config = parse(&[]);
        assert_eq!(config, ProbeConfig::default());
    }

    #[test]
    fn positional_server_and_timeout() {
        let config = parse(&["research_server.py", "--timeout-secs", "3"]);
        assert_eq!(config.server, PathBuf::from("research_server.py"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.runner_args, vec!["run", "python"]);
    }

    #[test]
    fn custom_runner_drops_default_args() {
        let config = parse(&["--runner", "python3"]);
        assert_eq!(config.runner, "python3");
        assert!(config.runner_args.is_empty());
    }

    #[test]
    fn explicit_runner_args_are_kept() {
        let config = parse(&["--runner", "node", "--runner-arg", "--no-warnings", "srv.js"]);
        assert_eq!(config.runner, "node");
        assert_eq!(config.runner_args, vec!["--no-warnings"]);
        assert_eq!(config.server, PathBuf::from("srv.js"));
    }
}
