// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for entity stores.

/// Errors that can occur reading from or writing to an entity store.
///
/// The in-memory store never fails; these come from [`DiskStore`](crate::DiskStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem I/O failed.
    #[error("Store I/O error at {path}: {details}")]
    Io {
        /// Path of the store file
        path: String,
        /// Details about the I/O error
        details: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Encoding or decoding the snapshot failed.
    #[error("Store serialization error: {details}")]
    Serialization {
        /// Details about the serialization error
        details: String,
        /// The underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create an `Io` error.
    pub fn io(path: impl Into<String>, details: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            details: details.into(),
            source,
        }
    }

    /// Create a `Serialization` error.
    pub fn serialization(details: impl Into<String>, source: serde_json::Error) -> Self {
        StoreError::Serialization {
            details: details.into(),
            source,
        }
    }
}
