//! The component graph core: the dependency combiner and the Root/Virtual
//! build pipeline that turn a DAG of component declarations into a flat
//! vector of [`SearchBox`]es.
//!
//! This crate owns [`RootComponent`], [`VirtualComponent`], the
//! [`combiner::combine`] join, and the [`Coordinator`] that drives the
//! whole graph. The key algebra itself lives one layer down, in
//! `combind_key`.

mod combination;
mod combiner;
mod component;
mod coordinator;
mod error;
mod props;
mod root;
mod search_box;
mod store;
mod virtual_component;

pub use combination::Combination;
pub use combiner::combine;
pub use component::{BuildContext, Component, ComponentKind, Query, QueryResult};
pub use coordinator::{root_set, Coordinator};
pub use error::CombindError;
pub use props::{merge_props, Props};
pub use root::{Modifier, ResultModifier, RootBuilder, RootComponent};
pub use search_box::{BackendComponent, Document, SearchBox};
pub use store::{ComponentStore, SearchBoxStore};
pub use virtual_component::{Rule, VirtualBuilder, VirtualComponent, VIRTUAL_BUILD_WORKERS};
