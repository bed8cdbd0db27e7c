use std::time::Duration;

use thiserror::Error;

/// Typed failures that callers may want to match on. Everything else is
/// reported through [`anyhow::Error`] with context attached.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ROLE is required")]
    MissingRole,

    #[error("role store did not respond within {0:?}")]
    StoreTimeout(Duration),

    /// A hierarchy rule that is not of the form `HIGH > LOW`
    #[error("invalid role hierarchy rule '{0}'")]
    InvalidHierarchy(String),

    #[error("role hierarchy contains a cycle through '{0}'")]
    HierarchyCycle(String),
}
