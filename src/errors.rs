// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the Ingestion Service
//!
//! This module defines the error taxonomy for the whole crate: broker
//! transport errors, payload codec errors, persistence errors and the
//! handler-level classification the consumer pipeline settles deliveries by.
//! Codec and store errors are local to a single delivery and never crash a
//! worker; only connectivity failure at startup is fatal.

use thiserror::Error;

/// Represents errors that can occur during AMQP/RabbitMQ operations.
///
/// This enum covers connection and channel establishment, topology
/// declarations, publishing and delivery settlement. Each variant provides
/// specific context about what operation failed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmqpError {
    /// Error establishing a connection to the broker (unreachable host or
    /// rejected credentials)
    #[error("failure to connect")]
    ConnectionError,

    /// Error creating a channel from an established connection
    #[error("failure to create a channel")]
    ChannelError,

    /// Error declaring an exchange with the given name. Declaring an
    /// existing exchange with conflicting arguments lands here as well:
    /// the broker refuses the redeclaration instead of resolving it.
    #[error("failure to declare an exchange `{0}`")]
    DeclareExchangeError(String),

    /// Error declaring a queue with the given name, including the
    /// conflicting-redeclaration case.
    #[error("failure to declare a queue `{0}`")]
    DeclareQueueError(String),

    /// Error binding a queue to an exchange
    #[error("failure to bind exchange `{0}` to queue `{1}`")]
    BindingExchangeToQueueError(String, String),

    /// Error configuring the per-worker prefetch window
    #[error("failure to configure qos on queue `{0}`")]
    QoSDeclarationError(String),

    /// Error registering a consumer on a queue
    #[error("failure to declare a consumer on queue `{0}`")]
    ConsumerDeclarationError(String),

    /// Consuming was requested before any queue subscription was registered
    #[error("no queue subscription registered")]
    MissingSubscriptionError,

    /// A consumer worker stopped abnormally
    #[error("failure to consume message `{0}`")]
    ConsumerError(String),

    /// Error publishing a message
    #[error("failure to publish")]
    PublishingError,

    /// Error acknowledging a delivery
    #[error("failure to ack message")]
    AckMessageError,

    /// Error negative-acknowledging a delivery for requeue
    #[error("failure to nack message")]
    NackMessageError,

    /// Error rejecting a delivery without requeue
    #[error("failure to reject message")]
    RejectMessageError,
}

/// Represents errors raised while converting wire payloads to records.
///
/// These are permanently unrecoverable for the delivery that carries the
/// payload: redelivering unparseable bytes cannot make them parse, so the
/// pipeline rejects such deliveries without requeue.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// The delivery carries a content type the codec does not speak
    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),

    /// The payload bytes do not parse as the expected structured format
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload parsed but carries no usable identity field
    #[error("record is missing its identity field")]
    MissingIdentity,
}

/// Represents failures surfaced by the persistence gateway.
///
/// The split drives the pipeline's settlement decision: transient failures
/// requeue the delivery for another attempt, permanent ones drop it.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The store is momentarily unavailable; a later attempt may succeed
    #[error("store temporarily unavailable: {0}")]
    Transient(String),

    /// The record violates a store invariant; retrying cannot fix it
    #[error("store rejected record: {0}")]
    Permanent(String),
}

/// Classification a record handler reports back to the consumer pipeline.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HandlerError {
    /// Worth retrying on redelivery
    #[error("transient handler failure: {0}")]
    Transient(String),

    /// Redelivery cannot fix it; the delivery must not be requeued
    #[error("permanent handler failure: {0}")]
    Permanent(String),
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transient(reason) => HandlerError::Transient(reason),
            StoreError::Permanent(reason) => HandlerError::Permanent(reason),
        }
    }
}

/// Represents errors raised while resolving the configuration surface.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required configuration variable is absent
    #[error("missing required configuration `{0}`")]
    MissingVar(String),

    /// A configuration variable is present but unusable
    #[error("invalid configuration `{0}`: {1}")]
    InvalidVar(String, String),
}
