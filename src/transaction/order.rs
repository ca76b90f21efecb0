// src/transaction/order.rs

//! Topological ordering of plan steps
//!
//! `order` rewrites the step list in place so that execution respects two
//! edge families derived from the universe:
//!
//! - **Dependency edges**: an installee is placed after the installees it
//!   requires; an erased package is placed after the erased packages that
//!   require it (dependents go away first).
//! - **Replacement edges**: an installee precedes the installed steps it
//!   obsoletes, so the replacement is on disk before the old package goes
//!   away. `OrderingMode::erase_before_install` reverses these edges to
//!   minimize peak disk usage.
//!
//! The sort is stable: mutually independent steps keep their decision
//! order. Cycles never fail the pass; they are broken deterministically
//! (see [`OrderingMode`]).

use super::Transaction;
use crate::queue::IdQueue;
use crate::universe::{PackageId, Universe};
use crate::Result;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Flags controlling the ordering pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderingMode {
    /// Remove obsoleted packages before installing their replacements
    pub erase_before_install: bool,
    /// Break dependency cycles at the step with the fewest unsatisfied
    /// predecessors instead of the lowest package id
    pub best_effort_cycles: bool,
}

impl OrderingMode {
    /// Create the default mode (install first, cycle break by lowest id)
    pub fn new() -> Self {
        Self::default()
    }

    /// Order erases of obsoleted packages before their replacements
    pub fn with_erase_before_install(mut self) -> Self {
        self.erase_before_install = true;
        self
    }

    /// Use the best-effort cycle-break heuristic
    pub fn with_best_effort_cycles(mut self) -> Self {
        self.best_effort_cycles = true;
        self
    }
}

impl Transaction {
    /// Reorder the steps in place into a dependency-safe execution order.
    ///
    /// Stable with respect to decision order, deterministic across calls,
    /// and idempotent for a fixed universe and mode. The step *set* never
    /// changes, only its sequence. Checks the cancel flag once at pass
    /// start. Callers must serialize this against concurrent reads of the
    /// same transaction.
    pub fn order(&mut self, universe: &Universe, mode: OrderingMode) -> Result<()> {
        self.assert_same_universe(universe);
        self.options().check_cancelled("order")?;

        let graph = StepGraph::build(self, universe, mode);
        let order = graph.stable_topological_order(universe, mode);

        let steps = self.step_slice();
        let reordered: IdQueue = order.iter().map(|&i| steps[i]).collect();
        log::debug!(
            "ordered {} steps over {} precedence edges",
            reordered.len(),
            graph.edge_count
        );
        self.set_ordered_steps(reordered);
        Ok(())
    }
}

/// Precedence graph over step indices
struct StepGraph {
    /// successors[i] holds the steps that must come after step i
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
    steps: Vec<PackageId>,
    edge_count: usize,
}

impl StepGraph {
    fn build(txn: &Transaction, universe: &Universe, mode: OrderingMode) -> Self {
        let steps: Vec<PackageId> = txn.step_slice().to_vec();
        let n = steps.len();

        // Install steps indexed by provided name, for dependency edges
        let mut installees_by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        // All step indices per id, for replacement edges (duplicates kept)
        let mut indices_by_id: HashMap<PackageId, Vec<usize>> = HashMap::new();
        for (i, &id) in steps.iter().enumerate() {
            indices_by_id.entry(id).or_default().push(i);
            let record = universe.record(id);
            if !record.installed {
                installees_by_name
                    .entry(record.name.as_str())
                    .or_default()
                    .push(i);
            }
        }

        let mut graph = Self {
            successors: vec![Vec::new(); n],
            in_degree: vec![0; n],
            steps,
            edge_count: 0,
        };
        let mut seen = HashSet::new();

        for i in 0..n {
            let record = universe.record(graph.steps[i]);
            if record.installed {
                // Erase side: whoever requires this package must be erased
                // before it, provided that dependent is erased too.
                for j in 0..n {
                    let other = universe.record(graph.steps[j]);
                    if other.installed && other.requires.contains(&record.name) {
                        graph.add_edge(&mut seen, j, i);
                    }
                }
            } else {
                // Install side: required installees come first.
                for required in &record.requires {
                    if let Some(providers) = installees_by_name.get(required.as_str()) {
                        for &j in providers {
                            graph.add_edge(&mut seen, j, i);
                        }
                    }
                }
                // Replacement edges: installee before what it obsoletes.
                for old in txn.older_replacements(universe, graph.steps[i]).iter() {
                    if let Some(old_indices) = indices_by_id.get(&old) {
                        for &k in old_indices {
                            if mode.erase_before_install {
                                graph.add_edge(&mut seen, k, i);
                            } else {
                                graph.add_edge(&mut seen, i, k);
                            }
                        }
                    }
                }
            }
        }

        graph
    }

    fn add_edge(&mut self, seen: &mut HashSet<(usize, usize)>, from: usize, to: usize) {
        if from == to || !seen.insert((from, to)) {
            return;
        }
        self.successors[from].push(to);
        self.in_degree[to] += 1;
        self.edge_count += 1;
    }

    /// Kahn's algorithm, always emitting the ready step with the lowest
    /// original index so that ties preserve decision order.
    ///
    /// When no step is ready the remaining steps contain at least one
    /// cycle. The break force-emits a deterministically chosen victim
    /// from inside a cycle that no other remaining step feeds into, so
    /// only edges within that cycle are relaxed; steps that are merely
    /// downstream of a cycle still wait for their dependencies. The
    /// victim is the cycle member with the lowest package id, or, under
    /// `best_effort_cycles`, the member with the fewest unsatisfied
    /// predecessors (ties again by lowest id).
    fn stable_topological_order(&self, universe: &Universe, mode: OrderingMode) -> Vec<usize> {
        let n = self.steps.len();
        let mut in_degree = self.in_degree.clone();
        let mut emitted = vec![false; n];
        let mut result = Vec::with_capacity(n);

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();

        while result.len() < n {
            let next = match ready.pop_first() {
                Some(i) => i,
                None => {
                    let victim = self.pick_cycle_victim(&in_degree, &emitted, mode);
                    log::debug!(
                        "breaking dependency cycle at package {} ({})",
                        self.steps[victim],
                        universe.record(self.steps[victim]).name
                    );
                    victim
                }
            };

            emitted[next] = true;
            result.push(next);
            for &succ in &self.successors[next] {
                if emitted[succ] {
                    continue;
                }
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    ready.insert(succ);
                }
            }
        }

        result
    }

    fn pick_cycle_victim(
        &self,
        in_degree: &[usize],
        emitted: &[bool],
        mode: OrderingMode,
    ) -> usize {
        let candidates = self.cycle_members(emitted).into_iter();
        if mode.best_effort_cycles {
            candidates
                .min_by_key(|&i| (in_degree[i], self.steps[i], i))
                .expect("cycle break requested on an acyclic remainder")
        } else {
            candidates
                .min_by_key(|&i| (self.steps[i], i))
                .expect("cycle break requested on an acyclic remainder")
        }
    }

    /// Steps eligible as cycle-break victims: members of a strongly
    /// connected component of the unemitted subgraph that has more than
    /// one member and no incoming edge from outside itself.
    ///
    /// With the ready queue empty every such source component is a real
    /// cycle, and breaking there cannot violate a still-satisfiable edge.
    fn cycle_members(&self, emitted: &[bool]) -> Vec<usize> {
        let n = self.steps.len();
        let mut scc = SccState::new(n);
        for v in 0..n {
            if !emitted[v] && scc.index[v] == usize::MAX {
                self.scc_visit(v, emitted, &mut scc);
            }
        }

        let mut component_size = vec![0usize; scc.component_count];
        for v in 0..n {
            if !emitted[v] {
                component_size[scc.component_of[v]] += 1;
            }
        }
        let mut has_incoming = vec![false; scc.component_count];
        for u in 0..n {
            if emitted[u] {
                continue;
            }
            for &v in &self.successors[u] {
                if !emitted[v] && scc.component_of[u] != scc.component_of[v] {
                    has_incoming[scc.component_of[v]] = true;
                }
            }
        }

        (0..n)
            .filter(|&v| {
                !emitted[v]
                    && component_size[scc.component_of[v]] > 1
                    && !has_incoming[scc.component_of[v]]
            })
            .collect()
    }

    /// Tarjan DFS over the unemitted subgraph
    fn scc_visit(&self, v: usize, emitted: &[bool], scc: &mut SccState) {
        scc.index[v] = scc.next_index;
        scc.lowlink[v] = scc.next_index;
        scc.next_index += 1;
        scc.stack.push(v);
        scc.on_stack[v] = true;

        for &w in &self.successors[v] {
            if emitted[w] {
                continue;
            }
            if scc.index[w] == usize::MAX {
                self.scc_visit(w, emitted, scc);
                scc.lowlink[v] = scc.lowlink[v].min(scc.lowlink[w]);
            } else if scc.on_stack[w] {
                scc.lowlink[v] = scc.lowlink[v].min(scc.index[w]);
            }
        }

        if scc.lowlink[v] == scc.index[v] {
            while let Some(w) = scc.stack.pop() {
                scc.on_stack[w] = false;
                scc.component_of[w] = scc.component_count;
                if w == v {
                    break;
                }
            }
            scc.component_count += 1;
        }
    }
}

/// Working state for Tarjan's strongly-connected-components pass
struct SccState {
    index: Vec<usize>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    component_of: Vec<usize>,
    component_count: usize,
}

impl SccState {
    fn new(n: usize) -> Self {
        Self {
            index: vec![usize::MAX; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            component_of: vec![usize::MAX; n],
            component_count: 0,
        }
    }
}
