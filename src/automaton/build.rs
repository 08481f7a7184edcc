use tracing::debug;

use super::{
    AutomatonBuildError, AutomatonDescription, AutomatonEdge, AutomatonState, RewardAutomaton,
    RewardConfig,
};
use crate::blackboard::Blackboard;
use crate::predicate::PredicateHandle;
use crate::registry::{PredicateRegistry, PropositionBinding};

impl RewardAutomaton {
    /// Bind the guards of `description` to the given proposition predicates.
    ///
    /// Proposition `i` of every guard resolves to `propositions[i]`, so all transitions referencing
    /// the same proposition share one predicate instance.
    pub fn materialize(
        description: &AutomatonDescription,
        propositions: &[PredicateHandle],
        config: RewardConfig,
    ) -> Result<Self, AutomatonBuildError> {
        let states = description
            .states
            .iter()
            .map(|state| -> Result<AutomatonState, AutomatonBuildError> {
                let transitions = state
                    .transitions
                    .iter()
                    .map(|transition| -> Result<AutomatonEdge, AutomatonBuildError> {
                        let predicate = transition.guard.to_predicate(propositions)?;
                        Ok(AutomatonEdge {
                            predicate,
                            end_state: transition.destination,
                            tokens: transition.tokens.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(AutomatonState::new(state.label.clone(), transitions))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(
            states,
            description.initial_state,
            description.acceptance_pairs.clone(),
            config,
        )
    }

    /// Instantiate a predicate for every proposition through `registry` and materialize the
    /// automaton over them.
    pub fn build(
        description: &AutomatonDescription,
        propositions: &[PropositionBinding],
        registry: &PredicateRegistry,
        blackboard: &Blackboard,
        config: RewardConfig,
    ) -> Result<Self, AutomatonBuildError> {
        let predicates = registry.instantiate_all(propositions, blackboard)?;

        debug!(
            propositions = predicates.len(),
            transitions = description.transition_count(),
            "Materializing automaton"
        );

        Self::materialize(description, &predicates, config)
    }
}
