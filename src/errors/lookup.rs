// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for dependent-entity lookups (tokens, pairs).

/// Errors returned by [`TokenSource`](crate::TokenSource) and
/// [`PairSource`](crate::PairSource) implementations.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The entity cannot be resolved at all.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind ("token", "pair")
        entity: &'static str,
        /// Lookup key, rendered
        key: String,
    },

    /// The upstream source failed while resolving the entity.
    #[error("{entity} lookup for {key} failed")]
    Upstream {
        /// Entity kind ("token", "pair")
        entity: &'static str,
        /// Lookup key, rendered
        key: String,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LookupError {
    /// Create a `NotFound` error.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        LookupError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create an `Upstream` error from any error type.
    pub fn upstream(
        entity: &'static str,
        key: impl ToString,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LookupError::Upstream {
            entity,
            key: key.to_string(),
            source: Box::new(source),
        }
    }
}
