// src/lib.rs

//! Transit Transaction Planner
//!
//! The transaction-planning layer of a package manager: given a consistent
//! set of install/remove decisions computed by an external constraint
//! solver over a package universe, produce a concrete, ordered, classified
//! execution plan for an installer to perform.
//!
//! # Architecture
//!
//! - Universe-first: a read-only catalog of package records that the
//!   planner queries and never mutates
//! - Transactions: step lists built from solver decisions, classified into
//!   semantic operation kinds and topologically ordered for safe execution
//! - Replacements: obsoletion/upgrade pairs resolved on demand, including
//!   many-to-one and one-to-many relationships
//! - Fail fast: cross-universe misuse and non-step queries panic with a
//!   diagnostic; empty results are values, never errors

mod error;
pub mod queue;
pub mod solver;
pub mod transaction;
pub mod universe;

pub use error::{Error, Result};
pub use queue::IdQueue;
pub use solver::{DecisionSet, ExplicitDecisions};
pub use transaction::{
    ClassificationMode, OrderingMode, PlanOptions, ReplacePair, StepGroup, StepType, Transaction,
};
pub use universe::{PackageId, PackageRecord, Universe, UniverseToken};
