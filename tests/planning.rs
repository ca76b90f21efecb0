// tests/planning.rs

//! Integration tests for the full planning flow.
//!
//! These tests verify that:
//! 1. A solver decision set becomes a transaction over the same universe
//! 2. Classification, replacement resolution and ordering agree with each
//!    other on a realistic mixed plan
//! 3. Aggregate classification produces a usable report

use semver::Version;
use transit::{
    ClassificationMode, DecisionSet, ExplicitDecisions, IdQueue, OrderingMode, PackageId,
    PackageRecord, StepType, Transaction, Universe,
};

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

/// A system with an upgrade, a fresh install with a dependency, a plain
/// removal, and an untouched bystander.
fn mixed_universe() -> (Universe, MixedIds) {
    let mut universe = Universe::new();
    let glibc_old = universe.add(
        PackageRecord::new("glibc", v("2.38.0"))
            .with_installed()
            .with_size_kib(9000),
    );
    let glibc_new = universe.add(PackageRecord::new("glibc", v("2.39.0")).with_size_kib(9200));
    let openssl = universe.add(PackageRecord::new("openssl", v("3.2.0")).with_size_kib(4000));
    let nginx = universe.add(
        PackageRecord::new("nginx", v("1.25.0"))
            .with_requires(["openssl", "glibc"])
            .with_size_kib(1500),
    );
    let telnet = universe.add(
        PackageRecord::new("telnet", v("0.17.0"))
            .with_installed()
            .with_size_kib(200),
    );
    universe.add(PackageRecord::new("bash", v("5.2.0")).with_installed());

    let ids = MixedIds {
        glibc_old,
        glibc_new,
        openssl,
        nginx,
        telnet,
    };
    (universe, ids)
}

struct MixedIds {
    glibc_old: PackageId,
    glibc_new: PackageId,
    openssl: PackageId,
    nginx: PackageId,
    telnet: PackageId,
}

/// Stand-in for an external solver that already decided the final state
struct StubSolver {
    result: ExplicitDecisions,
}

impl DecisionSet for StubSolver {
    fn universe_token(&self) -> transit::UniverseToken {
        self.result.universe_token()
    }

    fn decisions(&self) -> IdQueue {
        self.result.decisions()
    }
}

#[test]
fn test_solver_to_ordered_classified_plan() {
    let (universe, ids) = mixed_universe();
    let solver = StubSolver {
        result: ExplicitDecisions::new(
            universe.token(),
            vec![
                ids.nginx,
                ids.glibc_new,
                ids.glibc_old,
                ids.telnet,
                ids.openssl,
            ]
            .into(),
        ),
    };

    let mut txn = Transaction::from_solver_result(&universe, &solver);
    txn.check(&universe).unwrap();
    assert_eq!(txn.step_count(), 5);

    // Replacement resolution before ordering
    assert_eq!(txn.newer_replacement(&universe, ids.glibc_old), Some(ids.glibc_new));
    assert_eq!(
        txn.older_replacements(&universe, ids.glibc_new).as_slice(),
        &[ids.glibc_old]
    );
    assert_eq!(txn.newer_replacement(&universe, ids.telnet), None);

    txn.order(&universe, OrderingMode::new()).unwrap();
    let steps = txn.steps();
    let pos = |id| steps.iter().position(|s| s == id).unwrap();

    // Dependencies precede nginx; the new glibc precedes the old one
    assert!(pos(ids.openssl) < pos(ids.nginx));
    assert!(pos(ids.glibc_new) < pos(ids.nginx));
    assert!(pos(ids.glibc_new) < pos(ids.glibc_old));

    // Ordering permutes but never changes the step set
    assert_eq!(steps.len(), 5);
    for id in [ids.nginx, ids.glibc_new, ids.glibc_old, ids.telnet, ids.openssl] {
        assert!(steps.contains(id));
    }

    // Classification after ordering
    let mode = ClassificationMode::new();
    let groups = txn.classify(&universe, mode).unwrap();
    let kinds: Vec<StepType> = groups.iter().map(|g| g.step_type).collect();
    assert_eq!(kinds, vec![StepType::Install, StepType::Upgrade, StepType::Erase]);

    let install = &groups[0];
    assert_eq!(install.count(), 2);
    let upgrade = &groups[1];
    assert_eq!(upgrade.count(), 2);
    let erase = &groups[2];
    assert_eq!(erase.steps.as_slice(), &[ids.telnet]);

    // Pair report for the upgrade
    let pairs = txn
        .classify_pairs(&universe, StepType::Upgrade, Some("glibc"), None, mode)
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].from, ids.glibc_old);
    assert_eq!(pairs[0].to, ids.glibc_new);
}

#[test]
fn test_ordering_leaves_clone_untouched() {
    let (universe, ids) = mixed_universe();
    let mut txn = Transaction::from_explicit_decisions(
        &universe,
        [ids.nginx, ids.openssl, ids.glibc_new, ids.glibc_old],
    );
    let snapshot = txn.clone();

    txn.order(&universe, OrderingMode::new()).unwrap();

    assert_eq!(
        snapshot.steps().as_slice(),
        &[ids.nginx, ids.openssl, ids.glibc_new, ids.glibc_old]
    );
    assert!(!snapshot.is_ordered());
}

#[test]
fn test_installed_result_and_size_after_plan() {
    let (universe, ids) = mixed_universe();
    let txn = Transaction::from_explicit_decisions(
        &universe,
        [ids.glibc_new, ids.glibc_old, ids.telnet, ids.openssl, ids.nginx],
    );

    let result = txn.installed_result(&universe);
    assert!(result.contains(ids.glibc_new));
    assert!(result.contains(ids.openssl));
    assert!(result.contains(ids.nginx));
    assert!(!result.contains(ids.glibc_old));
    assert!(!result.contains(ids.telnet));

    // +9200 - 9000 - 200 + 4000 + 1500
    assert_eq!(txn.install_size_change(&universe), 5500);
}

#[test]
fn test_empty_plan_reports_nothing() {
    let (universe, _) = mixed_universe();
    let txn = Transaction::from_explicit_decisions(&universe, []);

    assert!(txn.is_empty());
    assert_eq!(txn.step_count(), 0);
    assert!(
        txn.classify(&universe, ClassificationMode::new())
            .unwrap()
            .is_empty()
    );
}
