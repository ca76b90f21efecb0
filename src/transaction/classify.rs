// src/transaction/classify.rs

//! Step classification and aggregate reporting
//!
//! Classification compares a step's installed/not-installed status in the
//! universe against the rest of the plan to decide its semantic kind: a
//! step on an installed package is an erase unless an installee replaces
//! it (upgrade/downgrade/reinstall), a step on a not-installed package is
//! an install unless it replaces something. [`ClassificationMode`] changes
//! the reading: with multiple coexisting versions allowed, same-name
//! replacements decompose into independent install and erase steps.

use super::Transaction;
use crate::queue::IdQueue;
use crate::universe::{PackageId, Universe};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Semantic kind of one plan step.
///
/// Declaration order is the fixed priority order used by
/// [`Transaction::classify`] when grouping steps for reporting.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// New package installed, nothing replaced
    Install,
    /// Same name and version installed again
    Reinstall,
    /// Additional version installed alongside an existing one
    MultiInstall,
    /// Same version installed again while other versions coexist
    MultiReinstall,
    /// Replacement by a higher version
    Upgrade,
    /// Replacement by a lower version
    Downgrade,
    /// Installed package removed, nothing replaces it
    Erase,
    /// Step resolves to no observable action under the current mode
    Ignore,
}

impl StepType {
    /// True for kinds that pair an erased package with its replacement
    pub fn is_replacement(&self) -> bool {
        matches!(self, Self::Upgrade | Self::Downgrade | Self::Reinstall)
    }
}

/// Flags controlling classification semantics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationMode {
    /// Treat same-name different-version coexistence as independent
    /// install/erase steps instead of upgrade/downgrade pairs
    pub allow_multi_version: bool,
    /// Exclude steps on locked packages from classification output
    pub ignore_locked: bool,
}

impl ClassificationMode {
    /// Create the default mode (single version, locked packages visible)
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow multiple concurrently-installed versions of a package
    pub fn with_multi_version(mut self) -> Self {
        self.allow_multi_version = true;
        self
    }

    /// Exclude steps on locked packages from classification
    pub fn with_ignore_locked(mut self) -> Self {
        self.ignore_locked = true;
        self
    }
}

/// One group of same-kind steps produced by [`Transaction::classify`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepGroup {
    pub step_type: StepType,
    /// Member steps, in plan order
    pub steps: IdQueue,
}

impl StepGroup {
    /// Number of steps in the group
    pub fn count(&self) -> usize {
        self.steps.len()
    }
}

/// A concrete (old, new) replacement reported by
/// [`Transaction::classify_pairs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacePair {
    /// The installed package being replaced
    pub from: PackageId,
    /// The installee replacing it
    pub to: PackageId,
}

impl Transaction {
    /// Determine the semantic kind of one step.
    ///
    /// Panics when `id` is not one of this transaction's steps or when
    /// `universe` is not the universe the plan was built from; both are
    /// caller bugs, not runtime conditions.
    pub fn classify_step(
        &self,
        universe: &Universe,
        id: PackageId,
        mode: ClassificationMode,
    ) -> StepType {
        self.assert_same_universe(universe);
        self.assert_is_step(id);

        let record = universe.record(id);
        if mode.ignore_locked && record.locked {
            return StepType::Ignore;
        }

        if record.installed {
            self.classify_erase_side(universe, id, mode)
        } else {
            self.classify_install_side(universe, id, mode)
        }
    }

    fn classify_erase_side(
        &self,
        universe: &Universe,
        id: PackageId,
        mode: ClassificationMode,
    ) -> StepType {
        if mode.allow_multi_version {
            return StepType::Erase;
        }
        match self.newer_replacement(universe, id) {
            None => StepType::Erase,
            Some(newer) => compare_versions(universe, newer, id),
        }
    }

    fn classify_install_side(
        &self,
        universe: &Universe,
        id: PackageId,
        mode: ClassificationMode,
    ) -> StepType {
        let record = universe.record(id);
        if mode.allow_multi_version {
            if universe.has_installed(&record.name, &record.version) {
                return StepType::MultiReinstall;
            }
            if universe.has_installed_named(&record.name) {
                return StepType::MultiInstall;
            }
            return StepType::Install;
        }

        let olders = self.older_replacements(universe, id);
        if olders.is_empty() {
            return StepType::Install;
        }
        // Prefer a same-name predecessor for the version comparison; an
        // obsoletion across names falls back to the first replaced step.
        let primary = olders
            .iter()
            .find(|&old| universe.record(old).name == record.name)
            .unwrap_or(olders[0]);
        compare_versions(universe, id, primary)
    }

    /// Partition the full step list by [`StepType`] under the given mode.
    ///
    /// Groups follow the declaration order of [`StepType`]; empty groups
    /// and ignored steps are omitted. Checks the cancel flag once at pass
    /// start.
    pub fn classify(
        &self,
        universe: &Universe,
        mode: ClassificationMode,
    ) -> Result<Vec<StepGroup>> {
        self.assert_same_universe(universe);
        self.options().check_cancelled("classify")?;

        let mut buckets: HashMap<StepType, IdQueue> = HashMap::new();
        for &step in self.step_slice() {
            let step_type = self.classify_step(universe, step, mode);
            if step_type == StepType::Ignore {
                continue;
            }
            buckets.entry(step_type).or_default().push(step);
        }

        let groups: Vec<StepGroup> = StepType::iter()
            .filter_map(|step_type| {
                buckets.remove(&step_type).map(|steps| StepGroup {
                    step_type,
                    steps,
                })
            })
            .collect();
        log::trace!("classified {} steps into {} groups", self.step_count(), groups.len());
        Ok(groups)
    }

    /// Concrete (old, new) pairs for a replacement-style step type,
    /// optionally restricted by old-name and new-name filters.
    ///
    /// Panics when `step_type` is not one of upgrade/downgrade/reinstall.
    pub fn classify_pairs(
        &self,
        universe: &Universe,
        step_type: StepType,
        from_name: Option<&str>,
        to_name: Option<&str>,
        mode: ClassificationMode,
    ) -> Result<Vec<ReplacePair>> {
        assert!(
            step_type.is_replacement(),
            "classify_pairs requires a replacement step type, got {step_type}"
        );
        self.assert_same_universe(universe);
        self.options().check_cancelled("classify_pairs")?;

        let mut pairs = Vec::new();
        for &step in self.step_slice() {
            if !universe.record(step).installed {
                continue;
            }
            let Some(to) = self.newer_replacement(universe, step) else {
                continue;
            };
            if self.classify_step(universe, step, mode) != step_type {
                continue;
            }
            if let Some(from_name) = from_name
                && universe.record(step).name != from_name
            {
                continue;
            }
            if let Some(to_name) = to_name
                && universe.record(to).name != to_name
            {
                continue;
            }
            pairs.push(ReplacePair { from: step, to });
        }
        Ok(pairs)
    }
}

/// Upgrade/downgrade/reinstall from the version relation of a replacement
fn compare_versions(universe: &Universe, new: PackageId, old: PackageId) -> StepType {
    match universe
        .record(new)
        .version
        .cmp(&universe.record(old).version)
    {
        Ordering::Greater => StepType::Upgrade,
        Ordering::Less => StepType::Downgrade,
        Ordering::Equal => StepType::Reinstall,
    }
}
