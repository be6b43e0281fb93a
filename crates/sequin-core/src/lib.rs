// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Sequin natural-language metrics assistant.
//!
//! This crate provides the foundational trait definitions, error type, and
//! common types used throughout the Sequin workspace: the response envelope
//! contract, conversation message types, and the collaborator seams (store,
//! generation backend, exporter, embeddings).

pub mod error;
pub mod traits;
pub mod types;

pub use error::SequinError;
pub use types::{
    ChatMessage, Generation, ResponseData, ResponseEnvelope, ResponseKind, Role, Row,
};

pub use traits::{EmbeddingBackend, Exporter, GenerationBackend, KeyValueStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequin_error_has_all_variants() {
        let _config = SequinError::Config("test".into());
        let _store = SequinError::Store {
            source: Box::new(std::io::Error::other("test")),
        };
        let _backend = SequinError::Backend {
            message: "test".into(),
            source: None,
        };
        let _export = SequinError::Export {
            message: "test".into(),
            source: None,
        };
        let _timeout = SequinError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _parse = SequinError::Parse("bad json".into());
        let _internal = SequinError::Internal("test".into());
    }

    #[test]
    fn error_messages_are_prefixed() {
        let err = SequinError::Backend {
            message: "connection refused".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "backend error: connection refused");

        let err = SequinError::Parse("truncated".into());
        assert!(err.to_string().contains("malformed backend reply"));
    }

    #[test]
    fn all_trait_seams_are_exported() {
        // Compile-time check that every collaborator seam is reachable
        // through the crate root.
        fn _assert_store<T: KeyValueStore>() {}
        fn _assert_backend<T: GenerationBackend>() {}
        fn _assert_exporter<T: Exporter>() {}
        fn _assert_embedding<T: EmbeddingBackend>() {}
    }
}
