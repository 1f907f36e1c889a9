// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Record Publisher
//!
//! The producer-side template: encodes a record through the wire codec and
//! publishes it to an exchange under a routing key, stamping the content
//! type, a fresh message id and the propagated trace context. Producers
//! and the consumer pipeline agree on the exchange/queue/routing-key
//! triple out-of-band; this publisher is the sending half of that
//! contract.

use crate::{codec, domain::User, errors::AmqpError, otel::AmqpTracePropagator};
use lapin::{
    options::BasicPublishOptions,
    types::{AMQPValue, FieldTable, ShortString},
    BasicProperties, Channel,
};
use opentelemetry::{global, Context};
use std::{collections::BTreeMap, sync::Arc};
use tracing::error;
use uuid::Uuid;

/// Publishes records to the broker over the shared setup channel.
pub struct RabbitMQPublisher {
    channel: Arc<Channel>,
}

impl RabbitMQPublisher {
    pub fn new(channel: Arc<Channel>) -> Arc<RabbitMQPublisher> {
        Arc::new(RabbitMQPublisher { channel })
    }

    /// Encodes and publishes one record.
    ///
    /// # Parameters
    /// * `ctx` - Trace context injected into the message headers
    /// * `exchange` - Exchange to publish to
    /// * `routing_key` - Routing key the binding matches on
    /// * `user` - The record to encode and send
    pub async fn publish(
        &self,
        ctx: &Context,
        exchange: &str,
        routing_key: &str,
        user: &User,
    ) -> Result<(), AmqpError> {
        let (data, content_type) = match codec::encode(user) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(error = err.to_string(), "error encoding record");
                return Err(AmqpError::PublishingError);
            }
        };

        let mut btree = BTreeMap::<ShortString, AMQPValue>::default();
        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(ctx, &mut AmqpTracePropagator::new(&mut btree))
        });

        match self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions {
                    immediate: false,
                    mandatory: false,
                },
                &data,
                BasicProperties::default()
                    .with_content_type(ShortString::from(content_type))
                    .with_message_id(ShortString::from(Uuid::new_v4().to_string()))
                    .with_headers(FieldTable::from(btree)),
            )
            .await
        {
            Err(err) => {
                error!(error = err.to_string(), "error publishing message");
                Err(AmqpError::PublishingError)
            }
            _ => Ok(()),
        }
    }
}
