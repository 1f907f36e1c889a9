// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! Service entrypoint: resolve configuration, establish the broker
//! connection, install the topology and consume until a shutdown signal
//! arrives. In-flight deliveries finish their settlement before the
//! connection closes.

use anyhow::Context as _;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use user_ingestor::{
    channel::new_amqp_channel,
    config::Configs,
    exchange::ExchangeDefinition,
    handler::IngestHandler,
    pipeline::ConsumerPipeline,
    queue::{QueueBinding, QueueDefinition},
    store::InMemoryUserStore,
    topology::{AmqpTopology, Topology},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cfg = Configs::from_env().context("failure to resolve configuration")?;

    let (conn, setup_channel) = new_amqp_channel(&cfg)
        .await
        .context("failure to reach the broker")?;

    let exchange = ExchangeDefinition::new(&cfg.binding.exchange)
        .direct()
        .durable();
    let queue = QueueDefinition::new(&cfg.binding.queue).durable();
    let binding = QueueBinding::new(&cfg.binding.queue)
        .exchange(&cfg.binding.exchange)
        .routing_key(&cfg.binding.routing_key);

    AmqpTopology::new()
        .exchange(&exchange)
        .queue(&queue)
        .queue_binding(&binding)
        .install(&setup_channel)
        .await
        .context("failure to install the topology")?;

    info!(
        queue = cfg.binding.queue,
        exchange = cfg.binding.exchange,
        routing_key = cfg.binding.routing_key,
        "topology installed, starting consumer"
    );

    let store = Arc::new(InMemoryUserStore::new());
    let handler = IngestHandler::new(store);
    let pipeline = ConsumerPipeline::new(conn.clone()).subscribe(&queue, handler);

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shutdown.cancel();
        }
    });

    pipeline.consume_blocking(token).await?;

    if let Err(err) = conn.close(200, "shutting down").await {
        error!(error = err.to_string(), "error closing the connection");
    }

    info!("consumer stopped");

    Ok(())
}
