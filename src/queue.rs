// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Queue Definitions and Bindings
//!
//! Builder types describing the queues this service declares and the
//! queue-to-exchange bindings that route records into them. A queue may opt
//! into a companion dead-letter queue; whether and how rejected deliveries
//! are dead-lettered remains a deployment decision, the builder only makes
//! the wiring available.

/// Definition of a queue with its declaration flags.
///
/// Builder-style: `QueueDefinition::new("user-queue").durable()`. The
/// ingestion queue is durable and not auto-deleted so it survives broker
/// restarts.
#[derive(Debug, Clone, Default)]
pub struct QueueDefinition {
    pub(crate) name: String,
    pub(crate) durable: bool,
    pub(crate) delete: bool,
    pub(crate) exclusive: bool,
    pub(crate) dlq_name: Option<String>,
}

impl QueueDefinition {
    pub fn new(name: &str) -> QueueDefinition {
        QueueDefinition {
            name: name.to_owned(),
            durable: false,
            delete: false,
            exclusive: false,
            dlq_name: None,
        }
    }

    /// Makes the queue durable, persisting across broker restarts.
    pub fn durable(mut self) -> Self {
        self.durable = true;
        self
    }

    /// Sets the queue to auto-delete when no longer used.
    pub fn delete(mut self) -> Self {
        self.delete = true;
        self
    }

    /// Makes the queue exclusive to the connection.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Adds a companion dead-letter queue named `<queue>-dlq`.
    ///
    /// Deliveries this service rejects without requeue are then routed
    /// there by the broker instead of being discarded.
    pub fn with_dlq(mut self) -> Self {
        self.dlq_name = Some(format!("{}-dlq", self.name));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A binding routing records from an exchange into a queue under an exact
/// routing key.
#[derive(Debug, Clone)]
pub struct QueueBinding<'qeb> {
    pub(crate) queue_name: &'qeb str,
    pub(crate) exchange_name: &'qeb str,
    pub(crate) routing_key: &'qeb str,
}

impl<'qeb> QueueBinding<'qeb> {
    /// Creates a binding for the given queue; exchange and routing key are
    /// set with the chained methods.
    pub fn new(queue: &'qeb str) -> QueueBinding<'qeb> {
        QueueBinding {
            queue_name: queue,
            exchange_name: "",
            routing_key: "",
        }
    }

    /// Sets the exchange to bind the queue to.
    pub fn exchange(mut self, exchange: &'qeb str) -> Self {
        self.exchange_name = exchange;
        self
    }

    /// Sets the routing key for the binding.
    pub fn routing_key(mut self, key: &'qeb str) -> Self {
        self.routing_key = key;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durable_queue_keeps_its_name_and_flags() {
        let def = QueueDefinition::new("user-queue").durable();

        assert_eq!(def.name(), "user-queue");
        assert!(def.durable);
        assert!(!def.delete);
        assert!(!def.exclusive);
    }

    #[test]
    fn dlq_companion_is_derived_from_the_queue_name() {
        let def = QueueDefinition::new("user-queue").durable().with_dlq();

        assert_eq!(def.dlq_name.as_deref(), Some("user-queue-dlq"));
    }

    #[test]
    fn binding_connects_the_declared_triple() {
        let binding = QueueBinding::new("user-queue")
            .exchange("user-exchange")
            .routing_key("user.created");

        assert_eq!(binding.queue_name, "user-queue");
        assert_eq!(binding.exchange_name, "user-exchange");
        assert_eq!(binding.routing_key, "user.created");
    }
}
