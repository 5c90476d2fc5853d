//! Stride Goal Graph
//!
//! Static goal-template catalog and the structures every other Stride crate
//! builds on:
//! - [`GoalTemplate`] and the parent/child [`GoalGraphEdge`] forest
//! - [`GoalGraph`]: adjacency table validated once at load time
//! - [`WeightTable`]: sibling weight distribution and redistribution
//! - [`GoalRecord`] / [`DailySnapshot`]: rows handed over by persistence
//!
//! # Example
//!
//! ```rust,ignore
//! use stride_graph::{GoalGraph, TemplateId};
//!
//! let graph = GoalGraph::builtin()?;
//! for child in graph.children(&TemplateId::new("dating")) {
//!     println!("{child}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod catalog;
mod error;
mod graph;
mod model;
mod template;
mod weights;

pub use catalog::{DocumentFormat, GoalCatalog};
pub use error::ConfigError;
pub use graph::GoalGraph;
pub use model::{DailySnapshot, GoalId, GoalRecord};
pub use template::{
    Cadence, GoalCategory, GoalGraphEdge, GoalTemplate, GraduationRule, LifeArea, ParseKindError,
    Phase, TemplateId, TimeHorizon,
};
pub use weights::{redistribute_weights, WeightChange, WeightTable, WEIGHT_SUM_TOLERANCE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
