// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Per-Delivery Consumption
//!
//! The state machine each delivery walks through:
//! decoded → persisted → acked on the success path, or settled as a
//! requeue (transient failure) or a drop (undecodable payload, permanent
//! failure). Every delivery is settled exactly once, and the settlement
//! decision is separated from the settlement itself so the decision logic
//! is testable without a broker.

use crate::{
    codec,
    errors::{AmqpError, HandlerError},
    handler::RecordHandler,
    otel,
};
use lapin::{
    message::Delivery,
    options::{BasicAckOptions, BasicNackOptions, BasicRejectOptions},
};
use opentelemetry::{
    global::BoxedTracer,
    trace::{Span, Status},
};
use std::borrow::Cow;
use tracing::{debug, error, warn};

/// How a delivery is to be settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Processed successfully; remove from the queue permanently
    Ack,
    /// Transient failure; negative-acknowledge for redelivery
    Requeue,
    /// Undecodable or permanently failed; remove without requeue
    Discard,
}

/// Decides how to settle one delivery.
///
/// Decode failures are permanently undeliverable: the payload will not
/// become parseable on redelivery, so the delivery is discarded and the
/// handler is never invoked. A successfully decoded record is handed to
/// the handler exactly once.
pub(crate) async fn dispose(
    payload: &[u8],
    content_type: Option<&str>,
    ctx: &opentelemetry::Context,
    handler: &dyn RecordHandler,
) -> Disposition {
    let user = match codec::decode(payload, content_type) {
        Ok(user) => user,
        Err(err) => {
            warn!(
                error = err.to_string(),
                "removing undecodable message from queue"
            );
            return Disposition::Discard;
        }
    };

    match handler.handle(ctx, &user).await {
        Ok(()) => Disposition::Ack,
        Err(HandlerError::Transient(reason)) => {
            warn!(id = user.id, reason = reason, "transient failure, requeuing");
            Disposition::Requeue
        }
        Err(HandlerError::Permanent(reason)) => {
            error!(id = user.id, reason = reason, "permanent failure, dropping");
            Disposition::Discard
        }
    }
}

/// Consumes one delivery: decide, then settle.
///
/// # Parameters
/// * `tracer` - Tracer the per-delivery consumer span is started from
/// * `delivery` - The delivery as handed over by the broker
/// * `queue` - Queue name, used as the span name
/// * `handler` - Handler the decoded record is dispatched to
pub(crate) async fn consume(
    tracer: &BoxedTracer,
    delivery: &Delivery,
    queue: &str,
    handler: &dyn RecordHandler,
) -> Result<(), AmqpError> {
    let (ctx, mut span) = otel::new_span(&delivery.properties, tracer, queue);

    debug!(
        "received delivery from exchange: {} with key: {}",
        delivery.exchange.to_string(),
        delivery.routing_key.to_string(),
    );

    let content_type = delivery
        .properties
        .content_type()
        .as_ref()
        .map(|ct| ct.as_str());

    match dispose(&delivery.data, content_type, &ctx, handler).await {
        Disposition::Ack => {
            match delivery.ack(BasicAckOptions { multiple: false }).await {
                Err(e) => {
                    error!("error whiling ack msg");
                    span.record_error(&e);
                    span.set_status(Status::Error {
                        description: Cow::from("error to ack msg"),
                    });
                    Err(AmqpError::AckMessageError)
                }
                _ => {
                    span.set_status(Status::Ok);
                    Ok(())
                }
            }
        }
        Disposition::Requeue => {
            match delivery
                .nack(BasicNackOptions {
                    multiple: false,
                    requeue: true,
                })
                .await
            {
                Err(e) => {
                    error!("error whiling nack msg");
                    span.record_error(&e);
                    span.set_status(Status::Error {
                        description: Cow::from("error to nack msg"),
                    });
                    Err(AmqpError::NackMessageError)
                }
                _ => {
                    span.set_status(Status::Error {
                        description: Cow::from("requeued after transient failure"),
                    });
                    Ok(())
                }
            }
        }
        Disposition::Discard => {
            match delivery
                .reject(BasicRejectOptions { requeue: false })
                .await
            {
                Err(e) => {
                    error!("error whiling reject msg");
                    span.record_error(&e);
                    span.set_status(Status::Error {
                        description: Cow::from("error to reject msg"),
                    });
                    Err(AmqpError::RejectMessageError)
                }
                _ => {
                    span.set_status(Status::Error {
                        description: Cow::from("delivery dropped"),
                    });
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec,
        domain::{PersistedUser, User},
        errors::StoreError,
        handler::IngestHandler,
        repository::MockUserRepository,
    };
    use std::sync::Arc;

    fn handler_with(repository: MockUserRepository) -> Arc<IngestHandler> {
        IngestHandler::new(Arc::new(repository))
    }

    fn encoded_user() -> (Vec<u8>, &'static str) {
        codec::encode(&User::new("u1", "Alice")).unwrap()
    }

    #[tokio::test]
    async fn persisted_delivery_is_acked() {
        let mut repository = MockUserRepository::new();
        repository.expect_save().times(1).returning(|user| {
            Ok(PersistedUser {
                id: user.id.clone(),
                name: user.name.clone(),
                revision: 1,
            })
        });
        let handler = handler_with(repository);
        let (payload, content_type) = encoded_user();

        let disposition = dispose(
            &payload,
            Some(content_type),
            &opentelemetry::Context::new(),
            handler.as_ref(),
        )
        .await;

        assert_eq!(disposition, Disposition::Ack);
    }

    #[tokio::test]
    async fn undecodable_payload_is_discarded_without_touching_the_store() {
        let mut repository = MockUserRepository::new();
        repository.expect_save().times(0);
        let handler = handler_with(repository);

        let disposition = dispose(
            b"{broken",
            Some(codec::JSON_CONTENT_TYPE),
            &opentelemetry::Context::new(),
            handler.as_ref(),
        )
        .await;

        assert_eq!(disposition, Disposition::Discard);
    }

    #[tokio::test]
    async fn transient_store_failure_requeues_the_delivery() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_save()
            .returning(|_| Err(StoreError::Transient("store offline".to_owned())));
        let handler = handler_with(repository);
        let (payload, content_type) = encoded_user();

        let disposition = dispose(
            &payload,
            Some(content_type),
            &opentelemetry::Context::new(),
            handler.as_ref(),
        )
        .await;

        assert_eq!(disposition, Disposition::Requeue);
    }

    #[tokio::test]
    async fn permanent_store_failure_drops_the_delivery() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_save()
            .returning(|_| Err(StoreError::Permanent("constraint violated".to_owned())));
        let handler = handler_with(repository);
        let (payload, content_type) = encoded_user();

        let disposition = dispose(
            &payload,
            Some(content_type),
            &opentelemetry::Context::new(),
            handler.as_ref(),
        )
        .await;

        assert_eq!(disposition, Disposition::Discard);
    }

    #[tokio::test]
    async fn undecodable_payload_does_not_block_the_next_delivery() {
        let mut repository = MockUserRepository::new();
        repository.expect_save().times(1).returning(|user| {
            Ok(PersistedUser {
                id: user.id.clone(),
                name: user.name.clone(),
                revision: 1,
            })
        });
        let handler = handler_with(repository);
        let ctx = opentelemetry::Context::new();
        let (payload, content_type) = encoded_user();

        let first = dispose(b"not json", None, &ctx, handler.as_ref()).await;
        let second = dispose(&payload, Some(content_type), &ctx, handler.as_ref()).await;

        assert_eq!(first, Disposition::Discard);
        assert_eq!(second, Disposition::Ack);
    }

    #[tokio::test]
    async fn redelivery_after_requeue_converges_on_the_stored_state() {
        use crate::{repository::UserRepository, store::InMemoryUserStore};

        let store = Arc::new(InMemoryUserStore::new());
        let handler = IngestHandler::new(store.clone());
        let ctx = opentelemetry::Context::new();
        let (payload, content_type) = encoded_user();

        // Broker redelivers the same record after a nack or crash-before-ack.
        let first = dispose(&payload, Some(content_type), &ctx, handler.as_ref()).await;
        let second = dispose(&payload, Some(content_type), &ctx, handler.as_ref()).await;

        assert_eq!(first, Disposition::Ack);
        assert_eq!(second, Disposition::Ack);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.save(&User::new("u1", "Alice")).await.unwrap().revision,
            1,
        );
    }
}
