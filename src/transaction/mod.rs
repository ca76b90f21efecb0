// src/transaction/mod.rs

//! Transaction planning engine
//!
//! A [`Transaction`] turns a solver's decision set into a concrete
//! execution plan: an ordered list of steps, each referencing one package
//! id in the universe the plan was built against. The module provides:
//!
//! - **Construction** from an explicit id list or a solver result
//! - **Classification** of each step into a semantic operation kind
//!   (install, erase, upgrade, ...), see [`StepType`]
//! - **Replacement resolution**: which installed packages an installee
//!   obsoletes, and which installee replaces an erased package
//! - **Ordering**: an in-place topological sort respecting dependency and
//!   replacement edges, see [`Transaction::order`]
//!
//! # Invariants
//!
//! Every query that takes a universe must be called with the same universe
//! the transaction was built from; a mismatch is caller misuse and panics.
//! The transaction never mutates the universe.
//!
//! # Concurrency
//!
//! Single-writer: callers serialize [`Transaction::order`] against reads.
//! There is no internal locking. The universe itself is read-only and may
//! be shared freely across transactions. Cloning yields an independently
//! owned step list; a clone is never affected by ordering the original.

mod classify;
mod order;

pub use classify::{ClassificationMode, ReplacePair, StepGroup, StepType};
pub use order::OrderingMode;

use crate::queue::IdQueue;
use crate::solver::DecisionSet;
use crate::universe::{PackageId, Universe, UniverseToken};
use crate::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Options for controlling plan computation
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Cancel token - set to true to request cancellation
    pub cancel: Option<Arc<AtomicBool>>,
}

impl PlanOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cancel token
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Check if cancellation has been requested
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Return Cancelled error if cancellation requested
    pub(crate) fn check_cancelled(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled(operation.to_string()))
        } else {
            Ok(())
        }
    }
}

/// An execution plan over one universe.
///
/// Steps start in decision order and move to execution order after
/// [`Transaction::order`]. Cloning produces a deep copy of the step list
/// and ordering state; only the (process-wide) cancel flag is shared.
#[derive(Debug, Clone)]
pub struct Transaction {
    universe_token: UniverseToken,
    steps: IdQueue,
    ordered: bool,
    options: PlanOptions,
}

impl Transaction {
    /// Build a plan whose steps are exactly the given ids, in the order
    /// given.
    ///
    /// Duplicate ids are preserved as distinct steps and classify
    /// independently. Ids are not resolved against the universe here; use
    /// [`Transaction::check`] to validate a whole plan up front.
    pub fn from_explicit_decisions(
        universe: &Universe,
        ids: impl IntoIterator<Item = PackageId>,
    ) -> Self {
        let steps: IdQueue = ids.into_iter().collect();
        log::debug!("planning transaction with {} explicit steps", steps.len());
        Self {
            universe_token: universe.token(),
            steps,
            ordered: false,
            options: PlanOptions::default(),
        }
    }

    /// Build a plan from an external solver's final decision record.
    ///
    /// Panics if the solver was run against a different universe; the
    /// produced plan's universe identity always equals `universe`'s.
    pub fn from_solver_result(universe: &Universe, solver: &impl DecisionSet) -> Self {
        assert_eq!(
            solver.universe_token(),
            universe.token(),
            "solver result was computed against a different universe"
        );
        let txn = Self::from_explicit_decisions(universe, solver.decisions());
        debug_assert_eq!(txn.universe_token, universe.token());
        txn
    }

    /// Identity of the universe this plan was built from
    pub fn universe_token(&self) -> UniverseToken {
        self.universe_token
    }

    /// True iff the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps in the plan (duplicates counted)
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Snapshot of the current step list.
    ///
    /// Decision order before [`Transaction::order`], execution order after.
    /// Later mutation of the transaction does not change a returned queue.
    pub fn steps(&self) -> IdQueue {
        self.steps.clone()
    }

    /// True once an ordering pass has run
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Set execution options (cancel token)
    pub fn set_options(&mut self, options: PlanOptions) {
        self.options = options;
    }

    /// Set the cancel token for subsequent planning passes
    pub fn set_cancel_token(&mut self, cancel: Arc<AtomicBool>) {
        self.options.cancel = Some(cancel);
    }

    /// Validate that every step id resolves in the universe.
    ///
    /// Independent problems are evaluated independently and collected into
    /// one aggregate error rather than stopping at the first.
    pub fn check(&self, universe: &Universe) -> Result<()> {
        self.assert_same_universe(universe);
        let errors: Vec<Error> = self
            .steps
            .iter()
            .filter(|&id| universe.get(id).is_none())
            .map(Error::UnknownPackage)
            .collect();
        Error::aggregate(errors)
    }

    /// For an installed package being erased, the single installee that
    /// replaces it.
    ///
    /// Returns `None` when the package is simply removed with no
    /// replacement, and also when `id` is not an installed package (an
    /// installee has no "newer" side).
    pub fn newer_replacement(&self, universe: &Universe, id: PackageId) -> Option<PackageId> {
        self.assert_same_universe(universe);
        let record = universe.record(id);
        if !record.installed {
            return None;
        }
        // First matching install step in step order keeps the relation
        // functional and inverse-consistent with older_replacements.
        self.steps
            .iter()
            .find(|&step| !universe.record(step).installed && replaces(universe, step, id))
    }

    /// For a not-yet-installed package being installed, every installed
    /// step it replaces, in step order.
    ///
    /// Empty when nothing is obsoleted, and also when `id` is already
    /// installed (an erase step has no "older" side).
    pub fn older_replacements(&self, universe: &Universe, id: PackageId) -> IdQueue {
        self.assert_same_universe(universe);
        let record = universe.record(id);
        let mut out = IdQueue::new();
        if record.installed {
            return out;
        }
        for step in self.steps.iter() {
            if universe.record(step).installed && replaces(universe, id, step) {
                out.push(step);
            }
        }
        out
    }

    /// The set of installed package ids after the plan executes: currently
    /// installed records not being erased, followed by the installees.
    pub fn installed_result(&self, universe: &Universe) -> IdQueue {
        self.assert_same_universe(universe);
        let mut out = IdQueue::new();
        for (id, record) in universe.iter() {
            if record.installed && !self.steps.contains(id) {
                out.push(id);
            }
        }
        for step in self.steps.iter() {
            if !universe.record(step).installed {
                out.push(step);
            }
        }
        out
    }

    /// Signed change in installed size (KiB) if the plan executes
    pub fn install_size_change(&self, universe: &Universe) -> i64 {
        self.assert_same_universe(universe);
        let mut change = 0i64;
        for step in self.steps.iter() {
            let record = universe.record(step);
            if record.installed {
                change -= record.size_kib as i64;
            } else {
                change += record.size_kib as i64;
            }
        }
        change
    }

    /// Replace the step list after an ordering pass
    pub(crate) fn set_ordered_steps(&mut self, steps: IdQueue) {
        debug_assert_eq!(steps.len(), self.steps.len());
        self.steps = steps;
        self.ordered = true;
    }

    pub(crate) fn step_slice(&self) -> &[PackageId] {
        self.steps.as_slice()
    }

    pub(crate) fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Fail fast when queried with a universe other than the one the plan
    /// was built from. Mismatch is caller misuse, never a runtime error.
    pub(crate) fn assert_same_universe(&self, universe: &Universe) {
        assert_eq!(
            self.universe_token,
            universe.token(),
            "transaction queried with a different universe than it was built from"
        );
    }

    /// Fail fast when a per-step query names an id that is not a step
    pub(crate) fn assert_is_step(&self, id: PackageId) {
        assert!(
            self.steps.contains(id),
            "package id {id} is not a step of this transaction"
        );
    }
}

/// True when installing `new` renders installed `old` removable: same
/// package name, or `new` explicitly obsoletes `old`'s name.
pub(crate) fn replaces(universe: &Universe, new: PackageId, old: PackageId) -> bool {
    if new == old {
        return false;
    }
    let new_record = universe.record(new);
    let old_record = universe.record(old);
    new_record.name == old_record.name || new_record.obsoletes.contains(&old_record.name)
}
