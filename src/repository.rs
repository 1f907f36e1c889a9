// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Persistence Gateway
//!
//! The minimal store-agnostic seam the consumer pipeline persists through.
//! Implementations must upsert by the record's identity field: saving the
//! same identity twice leaves one logical stored entity, which is what lets
//! the pipeline survive at-least-once delivery without duplicating data.

use crate::{
    domain::{PersistedUser, User},
    errors::StoreError,
};
use async_trait::async_trait;

/// Store-agnostic persistence interface.
///
/// `save` must be idempotent per identity: the broker may redeliver a
/// record after a nack or a crash before ack, and the store write happens
/// before the ack, so repeated saves of the same record must converge on
/// the same stored state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Upserts the record and returns it with any store-assigned fields.
    ///
    /// # Returns
    /// The persisted record, or a StoreError classified as transient
    /// (worth a retry) or permanent (not).
    async fn save(&self, user: &User) -> Result<PersistedUser, StoreError>;
}
