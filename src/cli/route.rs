//! Route command implementation

use crate::cli::output::{format_decision_json, format_decision_pretty};
use crate::cli::RouteArgs;
use crate::client::BackendRequest;

/// Handle `switchboard route`
pub async fn handle_route(args: &RouteArgs) -> anyhow::Result<()> {
    let config = crate::cli::load_config(&args.config)?;
    config.validate()?;

    let gateway = crate::cli::run::build_gateway(&config).await?;
    if gateway.models().is_some() {
        gateway.resolve_deployment(&args.model).await?;
    }

    let output = if args.dry_run {
        let (_, decision) = gateway.select(&args.organization, &args.model)?;
        if args.json {
            format_decision_json(&decision, None)?
        } else {
            format_decision_pretty(&decision, None)
        }
    } else {
        let request = BackendRequest {
            max_tokens: args.max_tokens,
            ..BackendRequest::new(&args.prompt)
        };
        let (response, decision) = gateway
            .route(&args.organization, &args.model, &request)
            .await?;
        if args.json {
            format_decision_json(&decision, Some(&response))?
        } else {
            format_decision_pretty(&decision, Some(&response))
        }
    };

    println!("{}", output);
    Ok(())
}
