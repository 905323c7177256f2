//! Headless dashboard runner.
//!
//! Mounts the live panels against a configured backend and logs what they see
//! until interrupted.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worldline_dashboard::infrastructure::{
    HttpGateway, LogNotifier, LoggingNavigator, MemoryRedirectStore, StaticTokenSource,
    TracingTelemetry, WsConnector,
};
use worldline_dashboard::pages::catalog;
use worldline_dashboard::ports::outbound::TokenSource;
use worldline_dashboard::{
    ChatPanel, DashboardConfig, MountOutcome, PageContext, StatusBadge, Subscription,
    WorldlineMonitor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldline_dashboard=debug,worldline_protocol=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DashboardConfig::from_env()?;
    tracing::info!(api = %config.api_url, ws = %config.ws_url, "Starting Worldline Dashboard");

    let tokens: Arc<dyn TokenSource> = Arc::new(StaticTokenSource::new(config.require_id_token()?)?);
    if let Some(identity) = tokens.identity() {
        tracing::info!(user = %identity.display_name, roles = ?identity.roles, "Signed in");
    }

    let ctx = PageContext {
        gateway: Arc::new(HttpGateway::new(&config.api_url, Arc::clone(&tokens))),
        tokens,
        connector: Arc::new(WsConnector::new()),
        telemetry: Arc::new(TracingTelemetry),
        notifier: Arc::new(LogNotifier),
        navigator: Arc::new(LoggingNavigator::new()),
        redirects: Arc::new(MemoryRedirectStore::new()),
        streaming: config.streaming(),
    };

    let chat = ChatPanel::new(&ctx);
    let monitor = WorldlineMonitor::new(&ctx, config.monitor());
    let customers = catalog::customers_page(&ctx);

    let badges: Vec<Subscription> = [
        ("chat", chat.client()),
        ("monitor", monitor.client()),
        ("customers", customers.client()),
    ]
    .into_iter()
    .map(|(panel, client)| {
        client.subscribe_to_status(move |status| {
            tracing::info!(panel, badge = StatusBadge::from(*status).label(), "Connection status");
        })
    })
    .collect();

    let (chat_outcome, monitor_outcome, customers_outcome) =
        tokio::join!(chat.mount(), monitor.mount(), customers.mount());
    for (panel, outcome) in [
        ("chat", chat_outcome),
        ("monitor", monitor_outcome),
        ("customers", customers_outcome),
    ] {
        match outcome {
            MountOutcome::Mounted { connected } => {
                tracing::info!(panel, connected, "Panel mounted");
            }
            MountOutcome::Denied(decision) => {
                tracing::warn!(panel, reason = %decision.reason, "Panel not permitted");
            }
        }
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!(
        customers = customers.records().len(),
        readings = monitor.series().len(),
        "Shutting down"
    );

    for badge in &badges {
        badge.unsubscribe();
    }
    customers.unmount();
    monitor.unmount();
    chat.unmount();
    Ok(())
}
