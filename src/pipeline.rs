// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Consumer Pipeline
//!
//! The listener bound to the ingestion queue. A subscription is registered
//! explicitly with [`ConsumerPipeline::subscribe`], then
//! [`ConsumerPipeline::consume_blocking`] (or the multi-worker variant)
//! drives deliveries through the per-delivery state machine. Each worker
//! runs on its own channel so settlement ordering is never corrupted
//! across workers, processes its deliveries sequentially, and finishes the
//! in-flight settlement before honoring a shutdown request.

use crate::{
    channel::create_channel,
    consumer::consume,
    errors::AmqpError,
    handler::RecordHandler,
    queue::QueueDefinition,
};
use futures_util::{future::join_all, StreamExt};
use lapin::{
    options::{BasicConsumeOptions, BasicQosOptions},
    types::FieldTable,
    Connection,
};
use opentelemetry::global;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// A registered queue subscription: the queue to listen on and the handler
/// every decoded record is dispatched to.
#[derive(Clone)]
struct Subscription {
    queue_def: QueueDefinition,
    handler: Arc<dyn RecordHandler>,
}

/// The consume side of the service.
///
/// Borrows the process-wide connection at construction time and opens one
/// settlement-capable channel per worker from it. The pipeline never
/// outlives the connection; tearing the connection down is the owner's
/// call.
pub struct ConsumerPipeline {
    connection: Arc<Connection>,
    subscription: Option<Subscription>,
}

impl ConsumerPipeline {
    pub fn new(connection: Arc<Connection>) -> ConsumerPipeline {
        ConsumerPipeline {
            connection,
            subscription: None,
        }
    }

    /// Registers the queue/handler pair this pipeline consumes for.
    ///
    /// The registration is visible as code, not annotation metadata: the
    /// caller names the declared queue and passes the handler in.
    pub fn subscribe(
        mut self,
        queue_def: &QueueDefinition,
        handler: Arc<dyn RecordHandler>,
    ) -> Self {
        self.subscription = Some(Subscription {
            queue_def: queue_def.clone(),
            handler,
        });
        self
    }

    /// Consumes from the subscribed queue with a single worker until the
    /// token is cancelled.
    pub async fn consume_blocking(&self, token: CancellationToken) -> Result<(), AmqpError> {
        self.consume_blocking_workers(1, token).await
    }

    /// Consumes from the subscribed queue with `workers` parallel workers.
    ///
    /// Every worker gets its own channel with a prefetch window of one, so
    /// a slow persistence call on one worker never reorders settlements on
    /// another. Deliveries within a worker are processed in receipt order.
    /// On cancellation each worker finishes the delivery it is processing,
    /// settles it, and exits.
    pub async fn consume_blocking_workers(
        &self,
        workers: usize,
        token: CancellationToken,
    ) -> Result<(), AmqpError> {
        let Some(subscription) = &self.subscription else {
            return Err(AmqpError::MissingSubscriptionError);
        };

        let queue = subscription.queue_def.name().to_owned();
        let mut spawns = vec![];

        for worker in 0..workers {
            let channel = create_channel(&self.connection).await?;

            if let Err(err) = channel.basic_qos(1, BasicQosOptions::default()).await {
                error!(error = err.to_string(), "failure to configure qos");
                return Err(AmqpError::QoSDeclarationError(queue));
            }

            let mut consumer = match channel
                .basic_consume(
                    &queue,
                    &format!("{}-worker-{}", queue, worker),
                    BasicConsumeOptions {
                        no_local: false,
                        no_ack: false,
                        exclusive: false,
                        nowait: false,
                    },
                    FieldTable::default(),
                )
                .await
            {
                Err(err) => {
                    error!(error = err.to_string(), "error to create the consumer");
                    Err(AmqpError::ConsumerDeclarationError(queue.clone()))
                }
                Ok(c) => Ok(c),
            }?;

            let handler = subscription.handler.clone();
            let queue_name = queue.clone();
            let token = token.clone();

            spawns.push(tokio::spawn(async move {
                let tracer = global::tracer("amqp consumer");

                loop {
                    tokio::select! {
                        _ = token.cancelled() => {
                            debug!(queue = queue_name, "shutdown requested, worker stopping");
                            break;
                        }
                        next = consumer.next() => match next {
                            Some(Ok(delivery)) => {
                                if let Err(err) =
                                    consume(&tracer, &delivery, &queue_name, handler.as_ref()).await
                                {
                                    error!(error = err.to_string(), "error consume msg");
                                }
                            }
                            Some(Err(err)) => {
                                error!(error = err.to_string(), "errors consume msg");
                            }
                            None => {
                                warn!(queue = queue_name, "consumer stream closed");
                                break;
                            }
                        },
                    }
                }
            }));
        }

        let spawned = join_all(spawns).await;
        for res in spawned {
            if res.is_err() {
                error!("consumer worker panicked");
                return Err(AmqpError::ConsumerError(queue));
            }
        }

        Ok(())
    }
}
