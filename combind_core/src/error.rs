//! Error types for building and persisting the component graph.
//!
//! Design principle, same as upstream: most errors should surface during
//! `Build` (dependency resolution, store access) rather than deep inside the
//! combiner's parallel fan-out, which keeps the hot path free of error-path
//! branching.

use thiserror::Error;

/// Errors produced by the build and persistence pipeline.
#[derive(Debug, Error)]
pub enum CombindError {
    /// A dependency failed to build; `component` names the Virtual component
    /// whose `Build` call is propagating the failure.
    #[error("failed to build dependency of '{component}': {source}")]
    DependencyBuild {
        /// Name of the component that could not complete its build.
        component: String,
        /// Underlying cause.
        #[source]
        source: Box<CombindError>,
    },

    /// A `ComponentStore` or `SearchBoxStore` call failed.
    #[error("store operation failed: {0}")]
    Store(String),

    /// A search-store integrity check failed after indexing a new
    /// generation; the alias swap was aborted and the prior generation is
    /// left serving.
    #[error("index integrity check failed: expected {expected} documents, found {actual}")]
    IndexIntegrity {
        /// Document count the new generation was expected to carry.
        expected: usize,
        /// Document count actually observed.
        actual: usize,
    },

    /// A combination matched no rule and the component's no-mapping fallback
    /// rule itself failed to produce a mapping. Logged at `warn` and the
    /// combination is skipped; not necessarily fatal to the overall build.
    #[error("no-mapping fallback failed for component '{component}'")]
    NoMappingFallback {
        /// Name of the Virtual component whose fallback rule failed.
        component: String,
    },

    /// The component graph contains a cycle; root-set derivation detected a
    /// component already on the current traversal path.
    #[error("cycle detected in component graph at '{0}'")]
    Cycle(String),

    /// Build was cancelled via the caller's cancellation flag.
    #[error("build cancelled")]
    Cancelled,

    /// Escape hatch for ad hoc failures, mirroring upstream's string-carrying
    /// variant.
    #[error("{0}")]
    Custom(String),
}

impl CombindError {
    /// Wraps `source` as a dependency-build failure attributed to `component`.
    pub fn dependency_build(component: impl Into<String>, source: CombindError) -> Self {
        Self::DependencyBuild {
            component: component.into(),
            source: Box::new(source),
        }
    }

    /// Builds a `Store` error from a display-able cause.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}
