//! Fraudwatch HTTP Server
//!
//! Wires the stores, the evaluation pipeline, the WebSocket hub and the
//! message-bus boundaries, then serves the REST API.

use anyhow::Result;
use fraudwatch_repository::{
    AlertStore, MemoryAlertStore, MemoryRuleStore, MemoryTransactionStore, RuleStore,
    TransactionStore,
};
use fraudwatch_runtime::{AlertLifecycle, EventSink, IngestPipeline, RiskScorer};
use fraudwatch_server::api::types::AppState;
use fraudwatch_server::api::create_router;
use fraudwatch_server::bus::{EventPublisher, NoopPublisher};
use fraudwatch_server::cache::{MemoryCacheStore, ResponseCache};
use fraudwatch_server::config::ServerConfig;
use fraudwatch_server::fanout::{BusTopics, FanoutSink};
use fraudwatch_server::rate_limit::RateLimiter;
use fraudwatch_server::rules_loader;
use fraudwatch_server::ws::StreamHub;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = ServerConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    // Stores
    let (transactions, alerts, rules) = build_stores(&config).await?;

    // Seed the rule set
    if let Some(path) = &config.rules_path {
        rules_loader::seed_rules(path, &rules).await?;
    }

    // Fan-out hub and heartbeat
    let hub = Arc::new(StreamHub::new(Duration::from_secs(config.ws.heartbeat_secs)));
    let _heartbeat = hub.spawn_heartbeat();

    // Topic publisher (NATS when configured and compiled in)
    #[cfg(feature = "nats")]
    let nats_client = match &config.bus.nats_url {
        Some(url) => {
            let client = async_nats::connect(url).await?;
            info!(url = %url, "connected to NATS");
            Some(client)
        }
        None => None,
    };

    #[cfg(feature = "nats")]
    let publisher: Arc<dyn EventPublisher> = match &nats_client {
        Some(client) => Arc::new(fraudwatch_server::bus::NatsPublisher::new(client.clone())),
        None => Arc::new(NoopPublisher),
    };
    #[cfg(not(feature = "nats"))]
    let publisher: Arc<dyn EventPublisher> = {
        if config.bus.nats_url.is_some() {
            tracing::warn!("nats_url is set but the server was built without the nats feature");
        }
        Arc::new(NoopPublisher)
    };

    let sink: Arc<dyn EventSink> = Arc::new(FanoutSink::new(
        hub.clone(),
        publisher,
        BusTopics {
            transactions: config.bus.transactions_topic.clone(),
            alerts: config.bus.alerts_topic.clone(),
        },
        config.source.clone(),
    ));

    // Pipeline and lifecycle manager
    let pipeline = Arc::new(IngestPipeline::new(
        RiskScorer::new(config.scoring.clone()),
        transactions.clone(),
        alerts.clone(),
        rules.clone(),
        sink.clone(),
    ));
    let lifecycle = Arc::new(AlertLifecycle::new(alerts.clone(), sink.clone()));

    // Bus consumer (tolerant duplicate policy)
    #[cfg(feature = "nats")]
    if let Some(client) = nats_client {
        let consumer = fraudwatch_server::bus::IngestConsumer::new(pipeline.clone());
        let subject = config.bus.transactions_topic.clone();
        tokio::spawn(async move {
            if let Err(e) = consumer.run(client, subject).await {
                tracing::error!(error = %e, "bus consumer terminated");
            }
        });
    }

    // Response cache and rate limiter share one key-value store
    let cache_store = Arc::new(MemoryCacheStore::new());
    let cache = ResponseCache::new(
        cache_store.clone(),
        config.cache.enabled,
        config.cache.key_prefix.clone(),
        Duration::from_secs(config.cache.ttl_secs),
    );
    let limiter = config.rate_limit.enabled.then(|| {
        RateLimiter::new(
            cache_store,
            config.rate_limit.max_requests,
            Duration::from_secs(config.rate_limit.window_secs),
        )
    });

    let state = AppState {
        pipeline,
        lifecycle,
        transactions,
        alerts,
        rules,
        sink,
        hub,
        cache,
        limiter,
    };
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Transactions API: http://{}/api/transactions", addr);
    info!("  Alerts API: http://{}/api/alerts", addr);
    info!("  Real-time stream: ws://{}/ws", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fraudwatch_server=info,fraudwatch_runtime=info,fraudwatch_repository=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}

/// Build the persistence stores from configuration
async fn build_stores(
    config: &ServerConfig,
) -> Result<(
    Arc<dyn TransactionStore>,
    Arc<dyn AlertStore>,
    Arc<dyn RuleStore>,
)> {
    if let Some(url) = &config.database_url {
        #[cfg(feature = "postgres")]
        {
            let stores = fraudwatch_repository::PostgresStores::connect(url).await?;
            info!("connected to PostgreSQL");
            return Ok((
                Arc::new(stores.clone()),
                Arc::new(stores.clone()),
                Arc::new(stores),
            ));
        }
        #[cfg(not(feature = "postgres"))]
        anyhow::bail!(
            "database_url {} is set but the server was built without the postgres feature",
            url
        );
    }

    info!("no database_url configured, using in-memory stores");
    Ok((
        Arc::new(MemoryTransactionStore::new()),
        Arc::new(MemoryAlertStore::new()),
        Arc::new(MemoryRuleStore::new()),
    ))
}
