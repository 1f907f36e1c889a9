// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Topology Management
//!
//! Declares the messaging topology the ingestion pipeline depends on: the
//! durable queue, the durable direct exchange and the binding between them
//! under the agreed routing key. AMQP declarations are idempotent as long
//! as the arguments match what already exists; redeclaring a name with
//! different flags is refused by the broker and surfaced as a declaration
//! error rather than silently resolved.

use crate::{
    errors::AmqpError,
    exchange::ExchangeDefinition,
    queue::{QueueBinding, QueueDefinition},
};
use async_trait::async_trait;
use lapin::{
    options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions},
    types::{AMQPValue, FieldTable, LongString, ShortString},
    Channel,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error};

/// Header field naming the dead-letter exchange of a queue
pub const AMQP_HEADERS_DEAD_LETTER_EXCHANGE: &str = "x-dead-letter-exchange";
/// Header field naming the dead-letter routing key of a queue
pub const AMQP_HEADERS_DEAD_LETTER_ROUTING_KEY: &str = "x-dead-letter-routing-key";

/// Interface for registering and installing the messaging topology.
///
/// Registration is pure bookkeeping; `install` borrows the setup channel
/// and performs the actual declarations against the broker.
#[async_trait]
pub trait Topology<'tp> {
    /// Adds an exchange definition to the topology.
    fn exchange(self, def: &'tp ExchangeDefinition) -> Self;

    /// Adds a queue definition to the topology.
    fn queue(self, def: &'tp QueueDefinition) -> Self;

    /// Adds a queue-to-exchange binding to the topology.
    fn queue_binding(self, binding: &'tp QueueBinding) -> Self;

    /// Declares every registered exchange and queue, then sets up the
    /// bindings. Safe to run repeatedly against the same broker.
    async fn install(&self, channel: &Channel) -> Result<(), AmqpError>;
}

/// AMQP implementation of the [`Topology`] trait.
///
/// Definitions are keyed by name, so registering the same queue or
/// exchange twice results in a single declaration.
#[derive(Default)]
pub struct AmqpTopology<'tp> {
    pub(crate) queues: HashMap<&'tp str, &'tp QueueDefinition>,
    pub(crate) exchanges: HashMap<&'tp str, &'tp ExchangeDefinition<'tp>>,
    pub(crate) queues_binding: Vec<&'tp QueueBinding<'tp>>,
}

impl<'tp> AmqpTopology<'tp> {
    pub fn new() -> AmqpTopology<'tp> {
        AmqpTopology::default()
    }
}

#[async_trait]
impl<'tp> Topology<'tp> for AmqpTopology<'tp> {
    fn exchange(mut self, def: &'tp ExchangeDefinition) -> Self {
        self.exchanges.insert(def.name, def);
        self
    }

    fn queue(mut self, def: &'tp QueueDefinition) -> Self {
        self.queues.insert(&def.name, def);
        self
    }

    fn queue_binding(mut self, binding: &'tp QueueBinding) -> Self {
        self.queues_binding.push(binding);
        self
    }

    async fn install(&self, channel: &Channel) -> Result<(), AmqpError> {
        self.install_exchanges(channel).await?;
        self.install_queues(channel).await?;
        self.install_bindings(channel).await
    }
}

impl<'tp> AmqpTopology<'tp> {
    async fn install_exchanges(&self, channel: &Channel) -> Result<(), AmqpError> {
        for (name, exch) in &self.exchanges {
            debug!("creating exchange: {}", name);

            match channel
                .exchange_declare(
                    exch.name,
                    exch.kind.clone().try_into()?,
                    ExchangeDeclareOptions {
                        passive: false,
                        durable: exch.durable,
                        auto_delete: exch.delete,
                        internal: exch.internal,
                        nowait: false,
                    },
                    FieldTable::default(),
                )
                .await
            {
                Err(err) => {
                    error!(
                        error = err.to_string(),
                        name = exch.name,
                        "error to declare the exchange"
                    );
                    Err(AmqpError::DeclareExchangeError(exch.name.to_owned()))
                }
                _ => Ok(()),
            }?;

            debug!("exchange: {} was created", name);
        }

        Ok(())
    }

    async fn install_queues(&self, channel: &Channel) -> Result<(), AmqpError> {
        for (name, def) in &self.queues {
            debug!("creating queue: {}", name);

            let mut queue_args = BTreeMap::new();

            if def.dlq_name.is_some() {
                self.declare_dlq(channel, def, &mut queue_args).await?;
            }

            match channel
                .queue_declare(
                    name,
                    QueueDeclareOptions {
                        passive: false,
                        durable: def.durable,
                        exclusive: def.exclusive,
                        auto_delete: def.delete,
                        nowait: false,
                    },
                    FieldTable::from(queue_args),
                )
                .await
            {
                Err(err) => {
                    error!(
                        error = err.to_string(),
                        name = *name,
                        "error to declare the queue"
                    );
                    Err(AmqpError::DeclareQueueError((*name).to_owned()))
                }
                _ => {
                    debug!("queue: {} was created", name);
                    Ok(())
                }
            }?;
        }

        Ok(())
    }

    /// Declares the companion dead-letter queue and points the main queue's
    /// dead-letter arguments at it through the default exchange.
    async fn declare_dlq(
        &self,
        channel: &Channel,
        def: &QueueDefinition,
        queue_args: &mut BTreeMap<ShortString, AMQPValue>,
    ) -> Result<(), AmqpError> {
        let Some(dlq_name) = def.dlq_name.clone() else {
            return Ok(());
        };

        match channel
            .queue_declare(
                &dlq_name,
                QueueDeclareOptions {
                    passive: false,
                    durable: def.durable,
                    exclusive: def.exclusive,
                    auto_delete: def.delete,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await
        {
            Err(err) => {
                error!(
                    error = err.to_string(),
                    "failure to declare dead-letter queue"
                );
                Err(AmqpError::DeclareQueueError(dlq_name))
            }
            _ => {
                queue_args.insert(
                    ShortString::from(AMQP_HEADERS_DEAD_LETTER_EXCHANGE),
                    AMQPValue::LongString(LongString::from("")),
                );
                queue_args.insert(
                    ShortString::from(AMQP_HEADERS_DEAD_LETTER_ROUTING_KEY),
                    AMQPValue::LongString(LongString::from(dlq_name)),
                );
                Ok(())
            }
        }
    }

    async fn install_bindings(&self, channel: &Channel) -> Result<(), AmqpError> {
        for binding in &self.queues_binding {
            debug!(
                "binding queue: {} to the exchange: {} with the key: {}",
                binding.queue_name, binding.exchange_name, binding.routing_key
            );

            match channel
                .queue_bind(
                    binding.queue_name,
                    binding.exchange_name,
                    binding.routing_key,
                    QueueBindOptions { nowait: false },
                    FieldTable::default(),
                )
                .await
            {
                Err(err) => {
                    error!(error = err.to_string(), "error to bind queue to exchange");

                    Err(AmqpError::BindingExchangeToQueueError(
                        binding.exchange_name.to_owned(),
                        binding.queue_name.to_owned(),
                    ))
                }
                _ => Ok(()),
            }?;
        }

        debug!("queue was bound");

        Ok(())
    }
}
