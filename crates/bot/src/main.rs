mod cli;
mod commands;
mod frontend;
mod metrics;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uplink_core::{
    load_config, validate_config, AllowList, ChatPlatform, ChatTarget, DeliveryOutcome,
    FfmpegTranscoder, JobPreferences, PipelineOrchestrator, PipelineRequest, PreferenceStore,
    SanitizedConfig, StatusRelay, TelegramClient, Transcoder,
};

use cli::{Cli, Mode, SendArgs};
use frontend::{BotFrontend, STATUS_BUFFER_SIZE};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("uplink {} starting", VERSION);

    // Load configuration
    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        config = %serde_json::to_string(&sanitized).unwrap_or_default(),
        "Configuration loaded successfully"
    );

    let client =
        Arc::new(TelegramClient::new(&config.telegram).context("Failed to create Telegram client")?);
    let allow_list = AllowList::from_config(&config.auth).context("Invalid allow-list")?;

    let transcoder = Arc::new(FfmpegTranscoder::new(config.converter.clone()));
    if let Err(e) = transcoder.validate().await {
        warn!(
            error = %e,
            "Transcoder unavailable, videos will be delivered without conversion"
        );
    }

    let orchestrator = PipelineOrchestrator::from_config(&config, transcoder, client.clone())
        .context("Failed to build pipeline")?;

    // Cancel running uploads on Ctrl+C / SIGTERM; cleanup still happens
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown requested, cancelling uploads");
        signal_cancel.cancel();
    });

    let result = match cli.mode() {
        Mode::Serve => {
            let frontend = BotFrontend::new(
                client,
                orchestrator,
                allow_list,
                Arc::new(PreferenceStore::new()),
                config.workspace.thumbnail_dir.clone(),
            );
            frontend.run(cancel).await;
            Ok(())
        }
        Mode::Send(args) => send_once(client, orchestrator, &allow_list, args, cancel).await,
    };

    debug!(metrics = %metrics::encode_metrics(), "Run metrics");
    info!("uplink stopped");
    result
}

/// Uploads one URL and reports the outcome through the exit status.
async fn send_once<T: Transcoder + 'static>(
    client: Arc<TelegramClient>,
    orchestrator: PipelineOrchestrator<T>,
    allow_list: &AllowList,
    args: SendArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let target = ChatTarget::new(args.chat);

    // Explicit guard before anything is dispatched
    if let Err(e) = allow_list.authorize(args.user) {
        if let Err(send_err) = client
            .send_message(&target, "You are not allowed to use this bot.")
            .await
        {
            warn!(error = %send_err, "Failed to notify rejected user");
        }
        return Err::<(), _>(e).context("Request rejected");
    }

    let request = PipelineRequest::new(args.url, target).with_preferences(JobPreferences {
        rename: args.rename,
        thumbnail: args.thumbnail,
    });

    // Relay status events to the chat
    let (status_tx, status_rx) = mpsc::channel(STATUS_BUFFER_SIZE);
    let relay = StatusRelay::new(client, target);
    let relay_handle = tokio::spawn(relay.run(status_rx));

    let report = orchestrator
        .spawn(request, status_tx, cancel)
        .await
        .context("Pipeline task failed")?;

    match relay_handle.await {
        Ok(stats) => debug!(?stats, "Status relay finished"),
        Err(e) => warn!(error = %e, "Status relay task failed"),
    }

    match report.outcome {
        DeliveryOutcome::Success(receipt) => {
            info!(
                run_id = %report.run_id,
                mode = %receipt.mode,
                file_name = %receipt.file_name,
                bytes = receipt.size_bytes,
                "Upload finished"
            );
            Ok(())
        }
        DeliveryOutcome::Failure { stage, reason } => {
            bail!("Upload failed while {}: {}", stage, reason)
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
