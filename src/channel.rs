// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # AMQP Connection and Channel Management
//!
//! The transport client owns the single physical connection to the broker.
//! It is created once at startup, shared behind an `Arc` by everything that
//! publishes or consumes, and torn down by the service's shutdown sequence.
//! Channels are cheap and multiplexed on top of it; each concurrent
//! consumer worker gets its own settlement-capable channel via
//! [`create_channel`].

use crate::{config::Configs, errors::AmqpError};
use lapin::{types::LongString, Channel, Connection, ConnectionProperties};
use std::sync::Arc;
use tracing::{debug, error};

/// Establishes the process-wide AMQP connection and a setup channel.
///
/// The connection is named after the application so it can be told apart in
/// the broker's management UI. Fails with `ConnectionError` when the broker
/// is unreachable or the credentials are rejected, which is fatal at
/// startup; a runtime supervisor may call this again to re-establish a
/// broken connection without restarting the pipeline.
///
/// # Returns
/// The shared connection and a channel on it, both Arc-wrapped.
pub async fn new_amqp_channel(
    cfg: &Configs,
) -> Result<(Arc<Connection>, Arc<Channel>), AmqpError> {
    debug!("creating amqp connection...");
    let options = ConnectionProperties::default()
        .with_connection_name(LongString::from(cfg.app.name.clone()));

    let uri = format!(
        "amqp://{}:{}@{}:{}/{}",
        cfg.rabbitmq.user,
        cfg.rabbitmq.password,
        cfg.rabbitmq.host,
        cfg.rabbitmq.port,
        cfg.rabbitmq.vhost.trim_start_matches('/'),
    );

    let conn = match Connection::connect(&uri, options).await {
        Ok(c) => Ok(c),
        Err(err) => {
            error!(error = err.to_string(), "failure to connect");
            Err(AmqpError::ConnectionError)
        }
    }?;
    debug!("amqp connected");

    let conn = Arc::new(conn);
    let channel = create_channel(&conn).await?;

    Ok((conn, channel))
}

/// Opens an additional channel on the shared connection.
///
/// Settlement ordering is per channel, so every concurrent worker must run
/// on its own channel rather than share the setup one.
pub async fn create_channel(conn: &Arc<Connection>) -> Result<Arc<Channel>, AmqpError> {
    debug!("creating amqp channel...");
    match conn.create_channel().await {
        Ok(channel) => {
            debug!("channel created");
            Ok(Arc::new(channel))
        }
        Err(err) => {
            error!(error = err.to_string(), "error to create the channel");
            Err(AmqpError::ChannelError)
        }
    }
}

/// Whether the shared connection is still usable.
///
/// The core mandates no reconnect policy; a supervisor polls this to decide
/// when to tear the process's transport down and build it again.
pub fn is_connected(conn: &Arc<Connection>) -> bool {
    conn.status().connected()
}
