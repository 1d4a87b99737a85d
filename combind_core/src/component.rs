//! The [`Component`] capability set shared by Root and Virtual components,
//! and the [`BuildContext`] threaded through every `build` call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::CombindError;
use crate::props::Props;
use crate::search_box::SearchBox;

/// Which of the two component variants a [`Component`] is. A tagged
/// variant is used here rather than runtime type-switching on a trait
/// object — root-set derivation (`crate::coordinator::root_set`) needs to
/// recognize Root components without depending on their concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// A leaf; materializes output from backend records.
    Root,
    /// An inner node; combines dependencies and applies rules.
    Virtual,
}

/// Request-scoped state threaded through every `Component::build` call: a
/// cooperative cancellation flag and caller-supplied properties.
///
/// There is no async runtime anywhere in this workspace, so cancellation is
/// a plain atomic flag rather than a future-aware cancellation token —
/// `Build` checks it at the points where it would otherwise block (channel
/// receives, dependency recursion) and surfaces [`CombindError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    cancelled: Option<Arc<AtomicBool>>,
    props: Props,
}

impl BuildContext {
    /// A context with no cancellation flag and empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying `props`, visible to every component's `build`.
    pub fn with_props(props: Props) -> Self {
        Self { cancelled: None, props }
    }

    /// Attaches a shared cancellation flag; setting it from any thread
    /// causes subsequent `build` calls sharing this context to fail fast.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    /// Caller-supplied properties for this build.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Returns [`CombindError::Cancelled`] if cancellation has been
    /// requested, `Ok(())` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::Cancelled`] if the attached flag is set.
    pub fn check_cancelled(&self) -> Result<(), CombindError> {
        if self.is_cancelled() {
            Err(CombindError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Query-integration placeholders. Query integration for the serving path
/// is out of scope here; these marker types exist so `Component`'s
/// capability set stays complete without pulling in a real query-builder
/// dependency. Root and Virtual components accept a query-builder closure
/// over `Query` at configuration time and simply never invoke it beyond
/// that no-op default.
#[derive(Debug, Default)]
pub struct Query;

/// See [`Query`].
#[derive(Debug, Default)]
pub struct QueryResult;

/// Polymorphic capability set shared by Root and Virtual components.
pub trait Component: Send + Sync {
    /// The component's type name — also the `SearchBox::type` of every box
    /// it produces.
    fn type_name(&self) -> &str;

    /// Which variant this component is.
    fn kind(&self) -> ComponentKind;

    /// Direct dependencies, in unspecified order. Empty for Root
    /// components.
    fn children(&self) -> Vec<Arc<dyn Component>>;

    /// Produces this component's output, memoized unless `rebuild` is set.
    ///
    /// # Errors
    ///
    /// Propagates any dependency build failure
    /// ([`CombindError::DependencyBuild`]), store failure
    /// ([`CombindError::Store`]), or cancellation
    /// ([`CombindError::Cancelled`]).
    fn build(&self, ctx: &BuildContext, rebuild: bool) -> Result<Vec<SearchBox>, CombindError>;

    /// Configures query integration for this component. Default: no-op
    /// (query integration is out of scope; see [`Query`]).
    fn build_query(&self, _query: &mut Query) {}

    /// Post-processes a query result. Default: identity (out of scope; see
    /// [`QueryResult`]).
    ///
    /// # Errors
    ///
    /// The default implementation never errors.
    fn handle(&self, result: QueryResult) -> Result<QueryResult, CombindError> {
        Ok(result)
    }
}
