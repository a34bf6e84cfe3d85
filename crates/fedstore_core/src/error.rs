/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::codec::{CodecError, DeliveryState};
use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{what}: expected a single row, got {rows}")]
    AmbiguousResult { what: String, rows: usize },
    #[error("decode: {0}")]
    Decode(#[from] CodecError),
    #[error("actor {0} already has this collection")]
    DuplicateActor(String),
    #[error("collection {collection} already belongs to {owner}")]
    DuplicateCollection { collection: String, owner: String },
    #[error("recursion depth limit {limit} exceeded")]
    RecursionLimitExceeded { limit: u32 },
    #[error("invalid range [{min}, {max})")]
    InvalidRange { min: i64, max: i64 },
    #[error("delivery attempt {id} is already {state}")]
    InvalidTransition { id: i64, state: DeliveryState },
    #[error(transparent)]
    Database(#[from] DbError),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
