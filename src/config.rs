// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Resolved Service Configuration
//!
//! The core only consumes resolved values; loading and supervising them is
//! a collaborator concern. `Configs::from_env` is the default loader used
//! by the service binary. All broker and binding values are required
//! strings with no defaults, apart from the conventional AMQP port and
//! vhost.

use crate::errors::ConfigError;
use std::env;

/// Application-level identity used to name the broker connection.
#[derive(Debug, Clone)]
pub struct AppConfigs {
    pub name: String,
}

/// Broker endpoint and credentials.
#[derive(Debug, Clone)]
pub struct RabbitMQConfigs {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
}

/// The exchange/queue/routing-key triple producers and this consumer agree
/// on out-of-band.
#[derive(Debug, Clone)]
pub struct BindingConfigs {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
}

/// Fully resolved configuration handed to the transport client and the
/// topology at construction time.
#[derive(Debug, Clone)]
pub struct Configs {
    pub app: AppConfigs,
    pub rabbitmq: RabbitMQConfigs,
    pub binding: BindingConfigs,
}

impl Configs {
    /// Resolves the configuration from the process environment.
    ///
    /// Required variables: `AMQP_HOST`, `AMQP_USER`, `AMQP_PASSWORD`,
    /// `AMQP_QUEUE`, `AMQP_EXCHANGE`, `AMQP_ROUTING_KEY`. Optional:
    /// `APP_NAME`, `AMQP_PORT` (5672), `AMQP_VHOST` ("/").
    ///
    /// # Returns
    /// The resolved configuration, or ConfigError naming the offending
    /// variable.
    pub fn from_env() -> Result<Configs, ConfigError> {
        Ok(Configs {
            app: AppConfigs {
                name: env::var("APP_NAME").unwrap_or_else(|_| "user-ingestor".to_owned()),
            },
            rabbitmq: RabbitMQConfigs {
                host: required("AMQP_HOST")?,
                port: port_from_env()?,
                user: required("AMQP_USER")?,
                password: required("AMQP_PASSWORD")?,
                vhost: env::var("AMQP_VHOST").unwrap_or_else(|_| "/".to_owned()),
            },
            binding: BindingConfigs {
                queue: required("AMQP_QUEUE")?,
                exchange: required("AMQP_EXCHANGE")?,
                routing_key: required("AMQP_ROUTING_KEY")?,
            },
        })
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(key.to_owned())),
    }
}

fn port_from_env() -> Result<u16, ConfigError> {
    match env::var("AMQP_PORT") {
        Err(_) => Ok(5672),
        Ok(raw) => raw
            .parse::<u16>()
            .map_err(|err| ConfigError::InvalidVar("AMQP_PORT".to_owned(), err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them serialized by testing
    // distinct variables per test.

    #[test]
    fn missing_required_variable_is_reported_by_name() {
        env::remove_var("AMQP_HOST");
        let err = required("AMQP_HOST").unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("AMQP_HOST".to_owned()));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        env::set_var("AMQP_EXCHANGE", "");
        let err = required("AMQP_EXCHANGE").unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("AMQP_EXCHANGE".to_owned()));
        env::remove_var("AMQP_EXCHANGE");
    }

    #[test]
    fn port_falls_back_to_amqp_default() {
        env::remove_var("AMQP_PORT");
        assert_eq!(port_from_env().unwrap(), 5672);
    }
}
