//! Oxide high-level IR.
//!
//! The HIR is what the type checker consumes: a tree of top-level items in
//! which every node carries a globally unique [`HirId`] and a source range,
//! and every reference has already been linked to its declaration by name
//! resolution.
//!
//! # Architecture
//!
//! - [`ids`]: node identities and the [`Mappings`] table (id allocation and
//!   id -> location lookup)
//! - [`node`]: items, statements, expressions and type references
//! - [`build`]: a small builder for assembling trees without a parser

pub mod build;
pub mod ids;
pub mod node;

pub use ids::{HirId, Mappings};
pub use node::*;
pub use rowan::{TextRange, TextSize};
