//! Reactive Model Error Hierarchy
//!
//! Defines error types for the model core, categorized by the bundling
//! protocol and store-mutation concerns.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bundling protocol failures (deadline, post-bundle mutation)
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// Document store mutation failures
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Quiescence was not reached within the configured deadline.
    /// Recoverable: the model stays mutable and bundling can be retried.
    #[error("model bundle took longer than {0:?}")]
    Timeout(Duration),

    /// Mutation attempted after a successful bundle. Not recoverable: the
    /// model is permanently frozen once bundled.
    #[error("model mutation performed after bundling")]
    MutationAfterBundle,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Mutation paths must name at least a collection and a document id
    #[error("mutation path '{path}' must include a collection and a document id")]
    InvalidPath { path: String },

    /// Setting a nested value through an intermediate that is not an object
    #[error("cannot set '{path}' through a non-object ancestor")]
    NonObjectAncestor { path: String },

    /// Op submission rejected by the synchronized document layer
    #[error("failed to submit op to document {collection}.{id}: {reason}")]
    Submit {
        collection: String,
        id: String,
        reason: String,
    },
}
