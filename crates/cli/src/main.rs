//! attacomm CLI - Main Entry Point
//!
//! Runs one test definition against an ATTA and reports the outcome.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use attacomm::{
    DomReady, Events, LoadParams, RecordingHarness, Session, SessionConfig, SessionEvent,
    SessionOutcome,
};
use attacomm_cli::output::{self, OutputFormat};
use attacomm_cli::report::{RunReport, RunStatus};

/// attacomm - drive an Assistive Technology Test Adapter
#[derive(Parser)]
#[command(name = "attacomm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Test definition file: a path, file:// URI or http(s):// URI
    #[arg(long)]
    test_file: Option<String>,

    /// Inline test definition (JSON)
    #[arg(long)]
    test: Option<String>,

    /// Test name announced to the ATTA
    #[arg(long)]
    name: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ATTA base URI
    #[arg(long, env = "ATTA_URI")]
    atta_uri: Option<String>,

    /// Timeout for every ATTA call, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// JSON file with the hosting framework's properties
    #[arg(long)]
    properties: Option<PathBuf>,

    /// Write results to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_file(path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => SessionConfig::default(),
        };
        if let Some(uri) = &self.atta_uri {
            config = config.with_adapter_uri(uri.clone());
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(path) = &self.properties {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let properties = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            config = config.with_properties(properties);
        }
        config.validate()?;
        Ok(config)
    }

    fn load_params(&self) -> LoadParams {
        LoadParams {
            // Text that is not JSON is handed over as-is and fails to load.
            test: self.test.clone().map(|text| {
                serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
            }),
            test_file: self.test_file.clone(),
            name: self.name.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let config = cli.session_config()?;
    let adapter_uri = config.adapter_uri.clone();
    info!("attacomm v{} using ATTA at {}", env!("CARGO_PKG_VERSION"), adapter_uri);
    if let Some(properties) = &config.properties {
        debug!("Harness properties: {:?}", properties);
    }

    let harness = Arc::new(RecordingHarness::new());
    let (events, mut rx) = Events::channel();
    let printer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            output::print_event(&event);
            seen.push(event);
        }
        seen
    });

    let session = Session::new(config, harness.clone(), events)?;

    // There is no document to wait for, so the DOM is ready from the start.
    let outcome = session.run(&cli.load_params(), DomReady::fired()).await?;
    drop(session);
    let events: Vec<SessionEvent> = printer.await?;

    output::print_cases(&harness.cases(), cli.format);
    if let SessionOutcome::Completed(summary) = &outcome {
        output::print_summary(summary);
    }

    let report = RunReport {
        adapter_uri,
        status: RunStatus::from(outcome),
        cases: harness.cases(),
        events,
    };
    if let Some(path) = &cli.output {
        report.write(path)?;
    }

    std::process::exit(report.exit_code());
}
