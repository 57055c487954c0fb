//! Run command implementation

use crate::cli::RunArgs;
use crate::client::BackendClient;
use crate::config::SwitchboardConfig;
use crate::gateway::Gateway;
use crate::model_registry::{
    InMemoryCache, JsonFileModelStore, KeyValueCache, ModelRegistry, ModelStore,
};
use crate::policy::StaticPolicyLoader;
use crate::telemetry::MetricsObserver;
use anyhow::Context;
use std::sync::Arc;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(args: &RunArgs) -> anyhow::Result<SwitchboardConfig> {
    let mut config = crate::cli::load_config(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    if let Some(ref environment) = args.environment {
        config.environment = environment.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.no_health_check {
        config.health_check.enabled = false;
    }

    Ok(config)
}

/// Connect the model registry when enabled in `config`.
pub async fn connect_model_registry(
    config: &SwitchboardConfig,
) -> anyhow::Result<Option<Arc<ModelRegistry>>> {
    let registry_config = config.effective_model_registry();
    if !registry_config.enabled {
        return Ok(None);
    }

    let path = registry_config
        .store_path
        .clone()
        .context("model_registry.store_path is required when the registry is enabled")?;
    let store: Arc<dyn ModelStore> = Arc::new(JsonFileModelStore::new(path));
    let cache: Arc<dyn KeyValueCache> = Arc::new(InMemoryCache::new());

    let registry = ModelRegistry::connect(&registry_config, store, Some(cache))
        .await
        .context("failed to connect model registry")?;
    Ok(Some(Arc::new(registry)))
}

/// Assemble a gateway from `config` with the HTTP client and static policies.
pub async fn build_gateway(config: &SwitchboardConfig) -> anyhow::Result<Gateway> {
    let models = connect_model_registry(config).await?;
    let loader = Arc::new(StaticPolicyLoader::new(config.resolved_policies()));

    let gateway = Gateway::from_config_with_observer(
        config,
        Arc::new(BackendClient::new()),
        loader,
        models,
        Arc::new(MetricsObserver),
    );

    let synced = gateway
        .sync_deployments()
        .await
        .context("failed to synchronize model deployments")?;
    if synced > 0 {
        tracing::info!(deployments = synced, "Registered model deployments");
    }

    Ok(gateway)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Main run command handler
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    crate::logging::init_tracing(&config.logging).map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(environment = %config.environment, "Starting Switchboard");
    tracing::debug!(?config, "Loaded configuration");

    let gateway = build_gateway(&config).await?;
    gateway.start()?;

    shutdown_signal().await;

    gateway.shutdown().await;
    tracing::info!("Switchboard stopped");
    Ok(())
}
