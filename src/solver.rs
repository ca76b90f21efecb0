// src/solver.rs

//! Interface to the external constraint solver
//!
//! Constraint solving is not this crate's job: a solver consumes the
//! universe and a set of requests and emits a consistent decision set. The
//! planner only needs two things from that result, captured by
//! [`DecisionSet`]: which universe it was solved against, and the final
//! list of decided package ids. An id naming an installed package means
//! "remove it"; an id naming a not-installed package means "install it".

use crate::queue::IdQueue;
use crate::universe::UniverseToken;

/// Final output of a constraint solver, consumed by
/// [`Transaction::from_solver_result`].
///
/// [`Transaction::from_solver_result`]: crate::Transaction::from_solver_result
pub trait DecisionSet {
    /// Identity of the universe the decisions were solved against
    fn universe_token(&self) -> UniverseToken;

    /// The decided package ids, in decision order
    fn decisions(&self) -> IdQueue;
}

/// Decision set carrier for callers that already hold a final id list.
#[derive(Debug, Clone)]
pub struct ExplicitDecisions {
    token: UniverseToken,
    ids: IdQueue,
}

impl ExplicitDecisions {
    pub fn new(token: UniverseToken, ids: IdQueue) -> Self {
        Self { token, ids }
    }
}

impl DecisionSet for ExplicitDecisions {
    fn universe_token(&self) -> UniverseToken {
        self.token
    }

    fn decisions(&self) -> IdQueue {
        self.ids.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::{PackageId, Universe};

    #[test]
    fn test_explicit_decisions_round_trip() {
        let universe = Universe::new();
        let ids: IdQueue = vec![PackageId(2), PackageId(0)].into();
        let decisions = ExplicitDecisions::new(universe.token(), ids.clone());

        assert_eq!(decisions.universe_token(), universe.token());
        assert_eq!(decisions.decisions(), ids);
    }
}
