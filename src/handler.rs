// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Record Handlers
//!
//! The seam between the consumer pipeline and the work done per decoded
//! record. A handler receives a decoded [`User`] and classifies any failure
//! as transient or permanent, which the pipeline translates into a requeue
//! or a drop. [`IngestHandler`] is the ingestion step itself: it persists
//! the record through the gateway injected at construction time.

use crate::{
    domain::User,
    errors::HandlerError,
    repository::UserRepository,
};
use async_trait::async_trait;
use opentelemetry::Context;
use std::sync::Arc;
use tracing::info;

/// Processes one decoded record per delivery.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    async fn handle(&self, ctx: &Context, user: &User) -> Result<(), HandlerError>;
}

/// The ingestion step: persist the decoded record.
///
/// The persistence gateway is an explicit constructor dependency, so the
/// pipeline never reaches for ambient state to store a record.
pub struct IngestHandler {
    repository: Arc<dyn UserRepository>,
}

impl IngestHandler {
    pub fn new(repository: Arc<dyn UserRepository>) -> Arc<IngestHandler> {
        Arc::new(IngestHandler { repository })
    }
}

#[async_trait]
impl RecordHandler for IngestHandler {
    async fn handle(&self, _ctx: &Context, user: &User) -> Result<(), HandlerError> {
        let persisted = self.repository.save(user).await?;

        info!(
            id = persisted.id,
            name = persisted.name,
            revision = persisted.revision,
            "record persisted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::PersistedUser, errors::StoreError, repository::MockUserRepository};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn persists_exactly_once_per_record() {
        let user = User::new("u1", "Alice");
        let mut repository = MockUserRepository::new();
        repository
            .expect_save()
            .with(eq(user.clone()))
            .times(1)
            .returning(|user| {
                Ok(PersistedUser {
                    id: user.id.clone(),
                    name: user.name.clone(),
                    revision: 1,
                })
            });

        let handler = IngestHandler::new(Arc::new(repository));

        assert!(handler.handle(&Context::new(), &user).await.is_ok());
    }

    #[tokio::test]
    async fn transient_store_failures_stay_transient() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_save()
            .returning(|_| Err(StoreError::Transient("store offline".to_owned())));

        let handler = IngestHandler::new(Arc::new(repository));
        let err = handler
            .handle(&Context::new(), &User::new("u1", "Alice"))
            .await
            .unwrap_err();

        assert_eq!(err, HandlerError::Transient("store offline".to_owned()));
    }

    #[tokio::test]
    async fn permanent_store_failures_stay_permanent() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_save()
            .returning(|_| Err(StoreError::Permanent("constraint violated".to_owned())));

        let handler = IngestHandler::new(Arc::new(repository));
        let err = handler
            .handle(&Context::new(), &User::new("u1", "Alice"))
            .await
            .unwrap_err();

        assert_eq!(err, HandlerError::Permanent("constraint violated".to_owned()));
    }
}
