// src/universe.rs

//! Read-only package universe
//!
//! The universe is the catalog the planner plans against: every known
//! package record with its static metadata (name, version, installed flag,
//! dependency/conflict/obsoletion edges). The planner only ever reads it.
//!
//! Each universe carries a stable identity token. A [`Transaction`] built
//! from one universe must be queried with that same universe; the token
//! comparison is the fail-fast check backing that invariant.
//!
//! [`Transaction`]: crate::Transaction

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for one package record in a universe.
///
/// Stable for the lifetime of the universe that issued it; meaningless
/// across different universes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PackageId(pub u32);

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a universe, compared on every cross-object call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniverseToken(Uuid);

impl UniverseToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Static metadata for one package in the universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub version: Version,
    /// Whether the package is currently present on the system
    pub installed: bool,
    /// Marked "don't touch"; excluded from classification under
    /// `ClassificationMode::ignore_locked`
    pub locked: bool,
    /// Installed size in KiB, used for aggregate size reporting
    pub size_kib: u64,
    /// Names of packages this one needs at runtime
    pub requires: Vec<String>,
    /// Names of packages this one cannot coexist with. Enforced by the
    /// solver when it computes the decision set; planning carries the
    /// field through for reporting but never consults it.
    pub conflicts: Vec<String>,
    /// Names of installed packages this one renders removable
    pub obsoletes: Vec<String>,
}

impl PackageRecord {
    /// Create a record for a not-installed, unlocked package
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            installed: false,
            locked: false,
            size_kib: 0,
            requires: Vec::new(),
            conflicts: Vec::new(),
            obsoletes: Vec::new(),
        }
    }

    /// Mark the package as currently installed
    pub fn with_installed(mut self) -> Self {
        self.installed = true;
        self
    }

    /// Mark the package as locked ("don't touch")
    pub fn with_locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Set the installed size in KiB
    pub fn with_size_kib(mut self, size_kib: u64) -> Self {
        self.size_kib = size_kib;
        self
    }

    /// Set the runtime dependency names
    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }

    /// Set the conflicting package names
    pub fn with_conflicts<I, S>(mut self, conflicts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflicts = conflicts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the names of packages this one obsoletes
    pub fn with_obsoletes<I, S>(mut self, obsoletes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.obsoletes = obsoletes.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only catalog of package records.
///
/// Records are appended while the catalog is assembled; planning never
/// mutates it. Shared read access from multiple transactions is safe.
#[derive(Debug)]
pub struct Universe {
    token: UniverseToken,
    records: Vec<PackageRecord>,
    by_name: HashMap<String, Vec<PackageId>>,
}

impl Universe {
    /// Create a new empty universe with a fresh identity token
    pub fn new() -> Self {
        Self {
            token: UniverseToken::new(),
            records: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// The stable identity of this universe
    pub fn token(&self) -> UniverseToken {
        self.token
    }

    /// Add a package record, returning the id it was assigned
    pub fn add(&mut self, record: PackageRecord) -> PackageId {
        let id = PackageId(self.records.len() as u32);
        self.by_name
            .entry(record.name.clone())
            .or_default()
            .push(id);
        self.records.push(record);
        id
    }

    /// Look up a record by id
    pub fn get(&self, id: PackageId) -> Option<&PackageRecord> {
        self.records.get(id.0 as usize)
    }

    /// Look up a record by id, panicking on an unknown id.
    ///
    /// Unknown ids are a caller bug (ids are only ever handed out by
    /// [`Universe::add`]), so this fails fast rather than propagating.
    pub fn record(&self, id: PackageId) -> &PackageRecord {
        self.get(id)
            .unwrap_or_else(|| panic!("package id {id} is not present in the universe"))
    }

    /// Number of records in the universe
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the universe holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over all records with their ids
    pub fn iter(&self) -> impl Iterator<Item = (PackageId, &PackageRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (PackageId(i as u32), r))
    }

    /// Ids of all records carrying the given name, in insertion order
    pub fn ids_named(&self, name: &str) -> &[PackageId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if any installed record with this name and version exists
    pub fn has_installed(&self, name: &str, version: &Version) -> bool {
        self.ids_named(name).iter().any(|&id| {
            let record = self.record(id);
            record.installed && record.version == *version
        })
    }

    /// True if any installed record with this name exists
    pub fn has_installed_named(&self, name: &str) -> bool {
        self.ids_named(name)
            .iter()
            .any(|&id| self.record(id).installed)
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}
