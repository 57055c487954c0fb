//! Check command implementation

use crate::cli::output::{format_health_json, format_health_table};
use crate::cli::CheckArgs;
use crate::client::{BackendClient, InferenceClient};
use crate::config::SwitchboardConfig;
use crate::health::{HealthMonitor, HealthStatus};
use crate::registry::BackendRegistry;
use futures::future::join_all;
use std::sync::Arc;

/// Probe every configured backend once and render the results.
///
/// Returns the rendered output and whether every backend answered.
pub async fn check_backends(
    config: &SwitchboardConfig,
    client: Arc<dyn InferenceClient>,
    json: bool,
) -> anyhow::Result<(String, bool)> {
    let registry = BackendRegistry::from_config(&config.backends);
    let monitor = HealthMonitor::new(client, config.health_check.clone());

    let probes = registry.list_backends().into_iter().map(|backend| {
        let monitor = &monitor;
        async move {
            let endpoint = backend.endpoint("");
            if let Err(e) = monitor.check_backend_now(&backend.id, endpoint).await {
                tracing::debug!(backend_id = %backend.id, error = %e, "Probe failed");
            }
        }
    });
    join_all(probes).await;

    let snapshot = monitor.snapshot();
    let all_healthy = snapshot
        .iter()
        .all(|h| h.status == HealthStatus::Healthy);

    let output = if json {
        format_health_json(&snapshot)?
    } else if snapshot.is_empty() {
        "No backends configured".to_string()
    } else {
        format_health_table(&snapshot)
    };
    Ok((output, all_healthy))
}

/// Handle `switchboard check`
pub async fn handle_check(args: &CheckArgs) -> anyhow::Result<()> {
    let config = crate::cli::load_config(&args.config)?;
    let (output, all_healthy) =
        check_backends(&config, Arc::new(BackendClient::new()), args.json).await?;
    println!("{}", output);

    if !all_healthy {
        anyhow::bail!("one or more backends failed their health check");
    }
    Ok(())
}
