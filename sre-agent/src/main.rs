use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sre_agent::{
    ai_health_check, fixture_backends, ollama_synthesizer, AnalysisRequest, IncidentAggregator,
};
use sre_core::backend::BackendSet;
use sre_core::config::AgentConfig;
use sre_core::connections::check_connections;
use sre_core::demo::demo_backends;
use sre_core::domain::{Priority, ServiceId};
use sre_core::error::AppError;
use sre_core::metrics::compute_system_metrics;
use sre_core::normalize::timestamps::now_rfc3339_utc;
use sre_core::probes::{ProbeContext, ProbeRegistry};

#[derive(Parser)]
#[command(name = "sre-agent")]
#[command(version, about = "Aggregate service health and synthesize an incident verdict")]
struct Cli {
    /// JSON config file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Replay backend answers from DIR/<service>/<op>.json
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "demo")]
    fixtures: Option<PathBuf>,

    /// Use the built-in demo backends
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one aggregation and print the response and system metrics
    Analyze {
        /// Free-text question about the incident
        query: String,
        /// Restrict to these services (repeatable); default routes by keywords
        #[arg(long = "service", value_name = "SERVICE")]
        services: Vec<ServiceId>,
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },

    /// Print system metrics for an empty history
    Metrics,

    /// Check the configuration for missing values
    ValidateConfig,

    /// Make one lightweight call against each backend and report reachability
    TestConnections {
        /// Restrict to these services (repeatable); default checks all
        #[arg(long = "service", value_name = "SERVICE")]
        services: Vec<ServiceId>,
    },

    /// Check that the local Ollama endpoint answers
    AiHealth,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new("OUTPUT_FAILED", "Failed to serialize output").with_details(e.to_string())
    })?;
    println!("{text}");
    Ok(())
}

fn backends(cli: &Cli) -> Result<BackendSet, AppError> {
    match (&cli.fixtures, cli.demo) {
        (Some(dir), _) => Ok(fixture_backends(dir)),
        (None, true) => Ok(demo_backends()),
        (None, false) => Err(AppError::new(
            "BACKEND_NOT_CONFIGURED",
            "No backend configured: pass --fixtures DIR or --demo",
        )),
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AgentConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Analyze {
            query,
            services,
            priority,
        } => {
            let registry = ProbeRegistry::from_backends(&backends(&cli)?);
            let aggregator = IncidentAggregator::new(config.clone(), registry, ollama_synthesizer(&config)?);
            let mut request = AnalysisRequest::new(query.clone()).with_priority(*priority);
            if !services.is_empty() {
                request = request.with_services(services.clone());
            }
            let response = aggregator.analyze(request).await;
            print_json(&response)?;
            print_json(&aggregator.get_system_metrics()?)?;
            aggregator.shutdown();
            if response.success {
                Ok(())
            } else {
                Err(AppError::new(
                    "ANALYSIS_FAILED",
                    response.error.unwrap_or_else(|| "Analysis failed".to_string()),
                ))
            }
        }
        Commands::Metrics => {
            let metrics = compute_system_metrics(None, &now_rfc3339_utc()?).with_analysis_stats(&[], 0);
            print_json(&metrics)
        }
        Commands::ValidateConfig => print_json(&config.validate()),
        Commands::TestConnections { services } => {
            let services = if services.is_empty() {
                ServiceId::ALL.to_vec()
            } else {
                services.clone()
            };
            let report =
                check_connections(&backends(&cli)?, &services, &ProbeContext::from_config(&config)).await;
            print_json(&report)
        }
        Commands::AiHealth => print_json(&ai_health_check(&config)?),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(details) = &e.details {
                eprintln!("  {details}");
            }
            ExitCode::FAILURE
        }
    }
}
