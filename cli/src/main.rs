//! portcullis CLI — driving adapter for the portcullis rule engine.
//!
//! Subcommands:
//! - `eval <config> [--method M] [--dispatch TYPE] [--auth-type T]` — evaluate a
//!   rule tree against an in-memory exchange
//! - `check <config>` — validate config loads without errors
//! - `info` — print registered type URLs

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portcullis::{
    evaluate, evaluate_with_trace, DirectContext, Registry, RegistryBuilder, RuleConfig,
    TracingContext,
};
use portcullis_http::{DispatcherType, HttpExchange, Method, SimpleExchange};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "portcullis", version, about = "Evaluate firewall rule trees")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a rule tree against a synthetic request
    Eval {
        /// Rule tree (YAML, or JSON by extension)
        config: PathBuf,
        /// Request method
        #[arg(long, default_value = "GET")]
        method: Method,
        /// Dispatcher type (REQUEST, FORWARD, INCLUDE, ASYNC, ERROR)
        #[arg(long = "dispatch", default_value = "REQUEST")]
        dispatcher_type: DispatcherType,
        /// Authentication scheme; unauthenticated when omitted
        #[arg(long)]
        auth_type: Option<String>,
        /// Log every node through `tracing` spans
        #[arg(long)]
        trace: bool,
        /// Print each dispatch in evaluation order
        #[arg(long)]
        explain: bool,
    },
    /// Validate that a rule tree loads
    Check {
        /// Rule tree (YAML, or JSON by extension)
        config: PathBuf,
    },
    /// Print registered type URLs
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Command::Eval { trace: true, .. }));

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(trace: bool) {
    let default = if trace { "portcullis=trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Eval {
            config,
            method,
            dispatcher_type,
            auth_type,
            trace,
            explain,
        } => {
            let mut builder = SimpleExchange::builder()
                .method(method)
                .dispatcher_type(dispatcher_type);
            if let Some(scheme) = auth_type {
                builder = builder.auth_type(scheme);
            }
            let report = cmd_eval(&config, builder.build(), trace, explain)?;
            print!("{report}");
            Ok(())
        }
        Command::Check { config } => cmd_check(&config),
        Command::Info => {
            cmd_info();
            Ok(())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(
    path: &Path,
    mut exchange: SimpleExchange,
    trace: bool,
    explain: bool,
) -> Result<String> {
    let root = build_registry()
        .load(load_config(path)?)
        .context("config load failed")?;
    tracing::debug!(path = %path.display(), depth = root.depth(), "rule tree loaded");

    let mut out = String::new();
    let verdict = if explain {
        let recorded = evaluate_with_trace(&root, &mut exchange).context("evaluation failed")?;
        for step in &recorded.steps {
            out.push_str(&format!(
                "{:indent$}{:?} {} -> {}\n",
                "",
                step.kind,
                step.node,
                step.outcome,
                indent = step.depth * 2
            ));
        }
        recorded.result
    } else if trace {
        evaluate(&root, &TracingContext, &mut exchange).context("evaluation failed")?
    } else {
        evaluate(&root, &DirectContext, &mut exchange).context("evaluation failed")?
    };

    tracing::info!(%verdict, method = %exchange.method(), "request evaluated");
    out.push_str(&format!("verdict: {verdict}\n"));
    out.push_str(&describe_exchange(&exchange));
    Ok(out)
}

fn cmd_check(path: &Path) -> Result<()> {
    build_registry()
        .load(load_config(path)?)
        .context("config invalid")?;
    println!("Config valid");
    Ok(())
}

fn cmd_info() {
    println!("Registered rules:");
    for url in build_registry().type_urls() {
        println!("  {url}");
    }
}

fn describe_exchange(exchange: &SimpleExchange) -> String {
    let mut out = String::new();
    let response = exchange.recorded();
    if let Some(status) = response.status() {
        out.push_str(&format!("status: {status}\n"));
    }
    if let Some(allow) = response.header("allow") {
        out.push_str(&format!("allow: {allow}\n"));
    }
    if let Some(message) = response.error_message() {
        out.push_str(&format!("message: {message}\n"));
    }
    if exchange.proceeded() > 0 {
        out.push_str("proceeded: yes\n");
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

fn build_registry() -> Registry<SimpleExchange> {
    portcullis_http::register(RegistryBuilder::new()).build()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(path: &Path) -> Result<RuleConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read \"{}\"", path.display()))?;
    let json = is_json(path);
    tracing::debug!(path = %path.display(), json, "parsing rule config");
    parse_config(&content, json)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn parse_config(content: &str, json: bool) -> Result<RuleConfig> {
    if json {
        serde_json::from_str(content).context("JSON parse error")
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(content).context("YAML parse error")
    }
}
