use axum::{
    Router,
    extract::Extension,
    routing::{delete, get, post},
};
use clap::Parser;
use distributed_multimap::config::NodeArgs;
use distributed_multimap::multimap::handlers::*;
use distributed_multimap::multimap::protocol::*;
use distributed_multimap::multimap::service::MultiMapService;
use distributed_multimap::partition::{PartitionManager, PartitionResolver};
use distributed_multimap::transport::handlers::{handle_event, handle_invoke};
use distributed_multimap::transport::http::HttpTransport;
use distributed_multimap::transport::protocol::{ENDPOINT_EVENT, ENDPOINT_INVOKE};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = NodeArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let (topology, config, bind_addr) = args.into_parts()?;

    tracing::info!("Starting member {} on {}", topology.local_id(), bind_addr);
    for member in topology.remote_members() {
        tracing::info!("  - peer {} http={}", member.id, member.http_addr);
    }

    // 1. Partition table:
    let partitioner = Arc::new(PartitionManager::new(
        topology.clone(),
        config.partition_count,
    ));
    tracing::info!(
        "Owning {} of {} partitions",
        partitioner.owned_partitions().len(),
        partitioner.partition_count()
    );

    // 2. Transport + service:
    let transport = Arc::new(HttpTransport::new(topology, &config));
    let service = MultiMapService::new(config, partitioner, transport);

    // 3. HTTP Router:
    let app = Router::new()
        .route(ENDPOINT_INVOKE, post(handle_invoke))
        .route(ENDPOINT_EVENT, post(handle_event))
        .route(ENDPOINT_PUT, post(handle_put))
        .route(ENDPOINT_REMOVE, post(handle_remove))
        .route(ENDPOINT_GET, get(handle_get))
        .route(ENDPOINT_KEYS, get(handle_keys))
        .route(ENDPOINT_VALUES, get(handle_values))
        .route(ENDPOINT_ENTRIES, get(handle_entries))
        .route(ENDPOINT_STATS, get(handle_stats))
        .route(ENDPOINT_MAP, delete(handle_destroy))
        .layer(Extension(service));

    // 4. Start HTTP server:
    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
