use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::Parser,
    guildwatch_collector::{Collector, CollectorSettings, Scheduler},
    guildwatch_config::{ExporterConfig, discover_and_load},
    guildwatch_discord::HttpDiscordClient,
    guildwatch_gateway::shutdown_signal,
    guildwatch_metrics::{GaugeStore, MetricsRecorderConfig},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// How long to wait for an in-flight cycle after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(
    name = "guildwatch",
    version,
    about = "Prometheus exporter for Discord guild membership and message counts"
)]
struct Cli {
    /// Config file (default: ./guildwatch.{toml,yaml,yml,json}, then the user config dir).
    #[arg(long, env = "GUILDWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Address to bind the metrics endpoint to (overrides config value).
    #[arg(long)]
    bind: Option<String>,
    /// Port for the metrics endpoint (overrides config value).
    #[arg(long)]
    port: Option<u16>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Apply command-line overrides on top of the loaded config.
fn apply_cli_overrides(cli: &Cli, config: &mut ExporterConfig) {
    if let Some(bind) = &cli.bind {
        config.metrics.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.metrics.port = port;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "guildwatch starting");

    let mut config =
        discover_and_load(cli.config.as_deref()).context("failed to load configuration")?;
    apply_cli_overrides(&cli, &mut config);
    info!(
        guild_id = %config.server_id,
        excluded = config.exclusion_set().len(),
        max_concurrent = config.collector.max_concurrent_channels,
        interval_secs = config.collector.update_interval_secs,
        "configuration loaded"
    );

    let client = HttpDiscordClient::new(
        config.token.clone(),
        &config.discord.api_base_url,
        config.collector.request_timeout(),
    )
    .context("failed to build Discord client")?;

    let store = Arc::new(GaugeStore::new(&MetricsRecorderConfig::default()));
    let collector = Arc::new(Collector::new(
        Arc::new(client),
        Arc::clone(&store),
        CollectorSettings::from_config(&config),
    ));

    let cancel = CancellationToken::new();
    let scheduler =
        Scheduler::new(collector, config.collector.update_interval()).spawn(cancel.clone());

    let served = guildwatch_gateway::serve(
        &config.metrics.bind,
        config.metrics.port,
        store,
        shutdown_signal(cancel.clone()),
    )
    .await;

    cancel.cancel();
    match tokio::time::timeout(SHUTDOWN_GRACE, scheduler).await {
        Ok(Ok(())) => {},
        Ok(Err(e)) => warn!(error = %e, "collector task failed"),
        Err(_) => warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "collector did not stop in time, abandoning in-flight cycle"
        ),
    }

    served?;
    info!("guildwatch stopped");
    Ok(())
}
