// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Domain Records
//!
//! The record type transported end-to-end plus the stored shape returned by
//! the persistence gateway. `User::id` is the identity field every
//! idempotency guarantee hangs on.

use serde::{Deserialize, Serialize};

/// The domain entity carried by each delivery.
///
/// Encoded forms round-trip through the codec back to an equal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity field used by the store for upsert
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: &str, name: &str) -> User {
        User {
            id: id.to_owned(),
            name: name.to_owned(),
        }
    }
}

/// A record as the store returns it, including the store-assigned revision.
///
/// The revision is assigned when an identity is first inserted and kept
/// stable across overwrites, so redelivering a record leaves the stored
/// state byte-for-byte identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUser {
    pub id: String,
    pub name: String,
    pub revision: u64,
}
