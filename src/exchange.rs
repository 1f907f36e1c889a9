// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Exchange Definitions
//!
//! Builder types describing the exchanges this service declares. The
//! ingestion topology uses a durable direct exchange (exact routing-key
//! match, no pattern matching); the kinds below mirror what the broker
//! supports so the topology module can translate them for the wire.

use crate::errors::AmqpError;

/// Exchange routing behavior.
///
/// - Direct: exact routing-key match
/// - Fanout: broadcast to every bound queue
/// - Topic: wildcard routing-key patterns
/// - Headers: match on header values instead of routing keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExchangeKind {
    #[default]
    Direct,
    Fanout,
    Topic,
    Headers,
}

impl TryInto<lapin::ExchangeKind> for ExchangeKind {
    type Error = AmqpError;

    fn try_into(self) -> Result<lapin::ExchangeKind, AmqpError> {
        match self {
            ExchangeKind::Direct => Ok(lapin::ExchangeKind::Direct),
            ExchangeKind::Fanout => Ok(lapin::ExchangeKind::Fanout),
            ExchangeKind::Topic => Ok(lapin::ExchangeKind::Topic),
            ExchangeKind::Headers => Ok(lapin::ExchangeKind::Headers),
        }
    }
}

/// Definition of an exchange with its declaration flags.
///
/// Builder-style: `ExchangeDefinition::new("user-exchange").direct().durable()`.
#[derive(Debug, Clone)]
pub struct ExchangeDefinition<'ex> {
    pub(crate) name: &'ex str,
    pub(crate) kind: ExchangeKind,
    pub(crate) durable: bool,
    pub(crate) delete: bool,
    pub(crate) internal: bool,
}

impl<'ex> ExchangeDefinition<'ex> {
    /// Creates a new exchange definition: direct, non-durable by default.
    pub fn new(name: &'ex str) -> ExchangeDefinition<'ex> {
        ExchangeDefinition {
            name,
            kind: ExchangeKind::Direct,
            durable: false,
            delete: false,
            internal: false,
        }
    }

    /// Sets the exchange type to Direct.
    pub fn direct(mut self) -> Self {
        self.kind = ExchangeKind::Direct;
        self
    }

    /// Sets the exchange type to Fanout.
    pub fn fanout(mut self) -> Self {
        self.kind = ExchangeKind::Fanout;
        self
    }

    /// Makes the exchange durable, persisting across broker restarts.
    pub fn durable(mut self) -> Self {
        self.durable = true;
        self
    }

    /// Sets the exchange to auto-delete when no longer used.
    pub fn delete(mut self) -> Self {
        self.delete = true;
        self
    }

    /// Makes the exchange internal, preventing direct publishing.
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_a_non_durable_direct_exchange() {
        let def = ExchangeDefinition::new("user-exchange");

        assert_eq!(def.name, "user-exchange");
        assert_eq!(def.kind, ExchangeKind::Direct);
        assert!(!def.durable);
    }

    #[test]
    fn durable_direct_is_what_the_ingestion_topology_declares() {
        let def = ExchangeDefinition::new("user-exchange").direct().durable();

        assert_eq!(def.kind, ExchangeKind::Direct);
        assert!(def.durable);
        assert!(!def.delete);
    }
}
