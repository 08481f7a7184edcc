use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use tracing::{debug, info, warn};

use super::distance::{distances_to_goal, Distance};
use super::{
    is_accepting_transition, AcceptancePair, AutomatonBuildError, AutomatonState, RewardConfig,
    Status,
};
use crate::predicate::{visit_predicates, Predicate};

/// Runtime automaton producing a shaped reward each tick.
///
/// Every tick the automaton evaluates the guards leaving its active state, follows the most robust
/// one and rewards the progress that transition makes towards an accepting state. The reward of a
/// tick lies in `[0, 1]` as long as guard robustness values are normalized to `[-1, 1]`.
///
/// Ticking and resetting require exclusive access; the automaton performs no internal locking.
#[derive(Debug)]
pub struct RewardAutomaton {
    states: Vec<AutomatonState>,
    acceptance_pairs: Vec<AcceptancePair>,
    initial_state: usize,
    active_state: usize,
    status: Status,
    tick_count: u64,
    last_tick_reward: f32,
    max_reward: f32,
    distance_to_goal: Vec<Distance>,
    max_distance_to_goal: u32,
    config: RewardConfig,
}

impl RewardAutomaton {
    /// Build the runtime from materialized states.
    ///
    /// Fails when the automaton has no states, when an index points outside the state array, or
    /// when no state is a positive finite number of transitions away from acceptance, in which case
    /// no progress can be measured.
    pub fn new(
        states: Vec<AutomatonState>,
        initial_state: usize,
        acceptance_pairs: Vec<AcceptancePair>,
        config: RewardConfig,
    ) -> Result<Self, AutomatonBuildError> {
        let count = states.len();

        if count == 0 {
            return Err(AutomatonBuildError::NoStates);
        }

        if initial_state >= count {
            return Err(AutomatonBuildError::InitialStateOutOfRange {
                index: initial_state,
                count,
            });
        }

        for (index, state) in states.iter().enumerate() {
            if let Some(edge) = state.transitions.iter().find(|edge| edge.end_state >= count) {
                return Err(AutomatonBuildError::DestinationOutOfRange {
                    state: index,
                    destination: edge.end_state,
                    count,
                });
            }
        }

        let (distance_to_goal, max_distance_to_goal) =
            distances_to_goal(&states, &acceptance_pairs);

        if max_distance_to_goal == 0 {
            return Err(AutomatonBuildError::NoProgressMetric);
        }

        let automaton = Self {
            states,
            acceptance_pairs,
            initial_state,
            active_state: initial_state,
            status: Status::Running,
            tick_count: 0,
            last_tick_reward: 0.0,
            max_reward: 0.0,
            distance_to_goal,
            max_distance_to_goal,
            config,
        };

        let unreachable = automaton.unreachable_states();
        if unreachable > 0 {
            warn!(
                unreachable,
                initial = initial_state,
                "States unreachable from the initial state"
            );
        }

        debug!(
            states = count,
            pairs = automaton.acceptance_pairs.len(),
            max_distance = max_distance_to_goal,
            "Built reward automaton"
        );

        Ok(automaton)
    }

    /// Advance the automaton by one step and return the reward of the step.
    ///
    /// A halted automaton, one whose status is no longer `Running` while
    /// [`RewardConfig::stop_on_acceptance`] is set, is left untouched and yields `0`. Transitions
    /// whose robustness is NaN are never taken. When every transition of the active state is NaN
    /// the automaton stays where it is and the step yields `0`.
    pub fn tick(&mut self) -> f32 {
        if self.status != Status::Running && self.config.stop_on_acceptance {
            debug!(
                status = %self.status,
                state = self.active_state,
                "Tick on halted automaton ignored"
            );
            return 0.0;
        }

        let current = self.active_state;
        let current_distance = self.distance_to_goal[current];
        let max_distance = self.max_distance_to_goal as f32;
        let transitions = &self.states[current].transitions;

        let mut best: Option<(usize, f32)> = None;
        let mut best_improving: Option<f32> = None;

        for (index, edge) in transitions.iter().enumerate() {
            let robustness = edge.predicate.evaluate_robustness();

            if robustness.is_nan() {
                continue;
            }

            // Ties keep the earlier transition.
            match best {
                Some((_, best_robustness)) if robustness <= best_robustness => {}
                _ => best = Some((index, robustness)),
            }

            if self.distance_to_goal[edge.end_state] < current_distance {
                match best_improving {
                    Some(best_robustness) if robustness <= best_robustness => {}
                    _ => best_improving = Some(robustness),
                }
            }
        }

        let (best_index, best_robustness) = match best {
            Some(best) => best,
            None if transitions.is_empty() => {
                // A state without outgoing transitions cannot continue any run.
                self.set_status(Status::WordRejected);
                self.finish_tick(current, 0.0);
                return 0.0;
            }
            None => {
                warn!(
                    state = current,
                    "No transition has a comparable robustness, staying in place"
                );
                self.finish_tick(current, 0.0);
                return 0.0;
            }
        };

        let best_edge = &transitions[best_index];
        let next_state = best_edge.end_state;

        let mut reward = match self.distance_to_goal[next_state] {
            Distance::Finite(hops) => (self.max_distance_to_goal - hops) as f32 / max_distance,
            Distance::Infinite => 0.0,
        };

        let mut status = self.status;

        if next_state == current {
            match best_improving {
                None if is_accepting_transition(&self.acceptance_pairs, best_edge) => {
                    status = Status::WordAccepted;

                    if !self.config.stop_on_acceptance {
                        reward += best_robustness;
                    }
                }
                None => {
                    status = Status::WordRejected;
                    reward = 0.0;
                }
                Some(near_miss) => {
                    if near_miss > 0.0 {
                        warn!(
                            state = current,
                            robustness = near_miss,
                            "Improving transition satisfied but not taken"
                        );
                    }

                    let near_miss = if self.config.clamp_near_miss {
                        near_miss.clamp(-1.0, 0.0)
                    } else {
                        near_miss
                    };

                    reward += (1.0 + near_miss) / max_distance;
                }
            }
        }

        debug!(
            state = current,
            next = next_state,
            robustness = best_robustness,
            reward,
            "Tick"
        );

        self.set_status(status);
        self.finish_tick(next_state, reward);

        reward
    }

    fn set_status(&mut self, status: Status) {
        if status != self.status {
            info!(
                from = %self.status,
                to = %status,
                tick = self.tick_count,
                "Automaton status changed"
            );
            self.status = status;
        }
    }

    fn finish_tick(&mut self, next_state: usize, reward: f32) {
        self.active_state = next_state;
        self.tick_count += 1;
        self.max_reward = self.max_reward.max(reward);
        self.last_tick_reward = reward;
    }

    /// Return to the initial state and reset every predicate reachable from a guard once.
    pub fn reset(&mut self) {
        self.active_state = self.initial_state;
        self.tick_count = 0;
        self.last_tick_reward = 0.0;
        self.max_reward = 0.0;
        self.status = Status::Running;

        let guards = self
            .states
            .iter()
            .flat_map(|state| state.transitions.iter())
            .map(|edge| &edge.predicate as &dyn Predicate);

        let mut predicates = 0;
        visit_predicates(guards, |predicate| {
            predicate.reset();
            predicates += 1;
        });

        info!(state = self.initial_state, predicates, "Automaton reset");
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[AutomatonState] {
        &self.states
    }

    pub fn acceptance_pairs(&self) -> &[AcceptancePair] {
        &self.acceptance_pairs
    }

    pub fn initial_state(&self) -> usize {
        self.initial_state
    }

    pub fn current_state(&self) -> usize {
        self.active_state
    }

    pub fn current_distance_to_goal(&self) -> Distance {
        self.distance_to_goal[self.active_state]
    }

    pub fn distance_to_goal(&self, state: usize) -> Option<Distance> {
        self.distance_to_goal.get(state).copied()
    }

    pub fn max_distance_to_goal(&self) -> u32 {
        self.max_distance_to_goal
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn last_tick_reward(&self) -> f32 {
        self.last_tick_reward
    }

    /// Largest single-tick reward since the last reset.
    pub fn max_reward(&self) -> f32 {
        self.max_reward
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn config(&self) -> RewardConfig {
        self.config
    }

    /// One-hot encoding of the active state.
    pub fn state_one_hot(&self) -> Vec<f32> {
        let mut encoding = vec![0.0; self.states.len()];
        encoding[self.active_state] = 1.0;
        encoding
    }

    /// Transition structure of the automaton. Edge weights count the parallel transitions between
    /// two states.
    pub fn state_graph(&self) -> DiGraphMap<usize, usize> {
        let mut graph = DiGraphMap::new();

        for (index, state) in self.states.iter().enumerate() {
            graph.add_node(index);

            for edge in &state.transitions {
                match graph.edge_weight_mut(index, edge.end_state) {
                    Some(count) => *count += 1,
                    None => {
                        graph.add_edge(index, edge.end_state, 1);
                    }
                }
            }
        }

        graph
    }

    fn unreachable_states(&self) -> usize {
        let graph = self.state_graph();
        let mut dfs = Dfs::new(&graph, self.initial_state);
        let mut reachable = 0;

        while dfs.next(&graph).is_some() {
            reachable += 1;
        }

        self.states.len() - reachable
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use approx::assert_relative_eq;

    use super::RewardAutomaton;
    use crate::automaton::{
        AcceptancePair, AutomatonBuildError, AutomatonEdge, AutomatonState, Distance, RewardConfig,
        Status,
    };
    use crate::operators::{Not, True};
    use crate::predicate::testing::Probe;
    use crate::predicate::PredicateHandle;

    fn pairs() -> Vec<AcceptancePair> {
        vec![AcceptancePair::new(["0"], ["1"])]
    }

    /// 0 -> 1 (`forward`), 0 -> 0 (`stay`), 1 -> 1 accepting.
    fn two_state(forward: &Rc<Probe>, stay: &Rc<Probe>, config: RewardConfig) -> RewardAutomaton {
        let states = vec![
            AutomatonState::new(
                "start",
                vec![
                    AutomatonEdge::new(forward.clone(), 1, Vec::<String>::new()),
                    AutomatonEdge::new(stay.clone(), 0, Vec::<String>::new()),
                ],
            ),
            AutomatonState::new("goal", vec![AutomatonEdge::new(Rc::new(True), 1, ["1"])]),
        ];

        RewardAutomaton::new(states, 0, pairs(), config).unwrap()
    }

    #[test]
    fn progress_then_acceptance() {
        let forward = Rc::new(Probe::new(1.0));
        let stay = Rc::new(Probe::new(-1.0));
        let mut automaton = two_state(&forward, &stay, RewardConfig::default());

        assert_eq!(automaton.distance_to_goal(0), Some(Distance::Finite(1)));
        assert_eq!(automaton.distance_to_goal(1), Some(Distance::Finite(0)));
        assert_eq!(automaton.max_distance_to_goal(), 1);

        assert_relative_eq!(automaton.tick(), 1.0);
        assert_eq!(automaton.current_state(), 1);
        assert_eq!(automaton.status(), Status::Running);

        assert_relative_eq!(automaton.tick(), 1.0);
        assert_eq!(automaton.status(), Status::WordAccepted);
        assert_eq!(automaton.tick_count(), 2);

        // Halted: further ticks change nothing.
        assert_eq!(automaton.tick(), 0.0);
        assert_eq!(automaton.tick_count(), 2);
        assert_relative_eq!(automaton.last_tick_reward(), 1.0);
    }

    #[test]
    fn near_miss_reward() {
        let forward = Rc::new(Probe::new(-0.25));
        let stay = Rc::new(Probe::new(0.5));
        let mut automaton = two_state(&forward, &stay, RewardConfig::default());

        // Staying yields no progress, the untaken improving edge contributes (1 - 0.25) / 1.
        assert_relative_eq!(automaton.tick(), 0.75);
        assert_eq!(automaton.current_state(), 0);
        assert_eq!(automaton.status(), Status::Running);
        assert_relative_eq!(automaton.max_reward(), 0.75);
    }

    #[test]
    fn near_miss_clamp() {
        let forward = Rc::new(Probe::new(0.5));
        let stay = Rc::new(Probe::new(0.75));

        let mut unclamped = two_state(&forward, &stay, RewardConfig::default());
        assert_relative_eq!(unclamped.tick(), 1.5);

        let mut clamped = two_state(&forward, &stay, RewardConfig::default().clamp_near_miss(true));
        assert_relative_eq!(clamped.tick(), 1.0);
    }

    #[test]
    fn continue_after_acceptance() {
        let forward = Rc::new(Probe::new(1.0));
        let stay = Rc::new(Probe::new(-1.0));
        let config = RewardConfig::default().stop_on_acceptance(false);
        let mut automaton = two_state(&forward, &stay, config);

        automaton.tick();
        assert_relative_eq!(automaton.tick(), 2.0);
        assert_eq!(automaton.status(), Status::WordAccepted);

        assert_relative_eq!(automaton.tick(), 2.0);
        assert_eq!(automaton.tick_count(), 3);
    }

    #[test]
    fn ties_prefer_first_transition() {
        let forward = Rc::new(Probe::new(0.5));
        let stay = Rc::new(Probe::new(0.5));
        let mut automaton = two_state(&forward, &stay, RewardConfig::default());

        automaton.tick();
        assert_eq!(automaton.current_state(), 1);
    }

    #[test]
    fn rejecting_sink() {
        let states = vec![
            AutomatonState::new(
                "start",
                vec![
                    AutomatonEdge::new(Rc::new(Probe::new(-1.0)), 1, Vec::<String>::new()),
                    AutomatonEdge::new(Rc::new(Probe::new(1.0)), 2, Vec::<String>::new()),
                ],
            ),
            AutomatonState::new("goal", vec![AutomatonEdge::new(Rc::new(True), 1, ["1"])]),
            AutomatonState::new(
                "sink",
                vec![AutomatonEdge::new(Rc::new(True), 2, Vec::<String>::new())],
            ),
        ];
        let mut automaton =
            RewardAutomaton::new(states, 0, pairs(), RewardConfig::default()).unwrap();

        assert_eq!(automaton.tick(), 0.0);
        assert_eq!(automaton.current_state(), 2);
        assert_eq!(automaton.current_distance_to_goal(), Distance::Infinite);
        assert_eq!(automaton.status(), Status::Running);

        assert_eq!(automaton.tick(), 0.0);
        assert_eq!(automaton.status(), Status::WordRejected);
    }

    #[test]
    fn state_without_transitions_rejects() {
        let states = vec![
            AutomatonState::new(
                "start",
                vec![AutomatonEdge::new(Rc::new(True), 1, Vec::<String>::new())],
            ),
            AutomatonState::new("goal", vec![AutomatonEdge::new(Rc::new(True), 1, ["1"])]),
            AutomatonState::new("dead", Vec::new()),
        ];
        let mut automaton =
            RewardAutomaton::new(states, 2, pairs(), RewardConfig::default()).unwrap();

        assert_eq!(automaton.tick(), 0.0);
        assert_eq!(automaton.status(), Status::WordRejected);
        assert_eq!(automaton.tick_count(), 1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let forward = Rc::new(Probe::new(1.0));
        let stay = Rc::new(Probe::new(-1.0));
        let mut automaton = two_state(&forward, &stay, RewardConfig::default());

        automaton.tick();
        automaton.tick();
        automaton.reset();

        assert_eq!(automaton.current_state(), 0);
        assert_eq!(automaton.status(), Status::Running);
        assert_eq!(automaton.tick_count(), 0);
        assert_eq!(automaton.last_tick_reward(), 0.0);
        assert_eq!(automaton.max_reward(), 0.0);
        assert_eq!(forward.resets.get(), 1);
        assert_eq!(stay.resets.get(), 1);
    }

    #[test]
    fn shared_predicates_reset_once() {
        let shared = Rc::new(Probe::new(1.0));
        let handle: PredicateHandle = shared.clone();
        let states = vec![
            AutomatonState::new(
                "start",
                vec![
                    AutomatonEdge::new(handle.clone(), 1, Vec::<String>::new()),
                    AutomatonEdge::new(handle.clone(), 0, Vec::<String>::new()),
                ],
            ),
            AutomatonState::new("goal", vec![AutomatonEdge::new(handle, 1, ["1"])]),
        ];
        let mut automaton =
            RewardAutomaton::new(states, 0, pairs(), RewardConfig::default()).unwrap();

        automaton.reset();
        assert_eq!(shared.resets.get(), 1);
    }

    #[test]
    fn inline_operands_are_reset() {
        let negated = Rc::new(Not::new(Probe::new(-1.0)));
        let stay = Rc::new(Probe::new(1.0));
        let states = vec![
            AutomatonState::new(
                "start",
                vec![
                    AutomatonEdge::new(negated.clone(), 1, Vec::<String>::new()),
                    AutomatonEdge::new(stay.clone(), 0, Vec::<String>::new()),
                ],
            ),
            AutomatonState::new("goal", vec![AutomatonEdge::new(Rc::new(True), 1, ["1"])]),
        ];
        let mut automaton =
            RewardAutomaton::new(states, 0, pairs(), RewardConfig::default()).unwrap();

        automaton.tick();
        automaton.reset();

        assert_eq!(negated.subpredicate().resets.get(), 1);
        assert_eq!(stay.resets.get(), 1);
    }

    #[test]
    fn nan_robustness_is_never_taken() {
        let forward = Rc::new(Probe::new(1.0));
        let stay = Rc::new(Probe::new(f32::NAN));
        let states = vec![
            AutomatonState::new(
                "start",
                vec![
                    AutomatonEdge::new(stay.clone(), 0, Vec::<String>::new()),
                    AutomatonEdge::new(forward.clone(), 1, Vec::<String>::new()),
                ],
            ),
            AutomatonState::new("goal", vec![AutomatonEdge::new(Rc::new(True), 1, ["1"])]),
        ];
        let mut automaton =
            RewardAutomaton::new(states, 0, pairs(), RewardConfig::default()).unwrap();

        assert_relative_eq!(automaton.tick(), 1.0);
        assert_eq!(automaton.current_state(), 1);

        // An unmeasurable improving edge adds no near-miss reward either.
        let mut automaton = two_state(
            &Rc::new(Probe::new(f32::NAN)),
            &Rc::new(Probe::new(0.5)),
            RewardConfig::default(),
        );
        assert_relative_eq!(automaton.tick(), 0.0);
        assert_eq!(automaton.current_state(), 0);
        assert_eq!(automaton.status(), Status::WordRejected);
    }

    #[test]
    fn all_nan_transitions_stay_in_place() {
        let nan = Rc::new(Probe::new(f32::NAN));
        let mut automaton = two_state(&nan, &nan, RewardConfig::default());

        assert_eq!(automaton.tick(), 0.0);
        assert_eq!(automaton.current_state(), 0);
        assert_eq!(automaton.status(), Status::Running);
        assert_eq!(automaton.tick_count(), 1);

        nan.set(1.0);
        assert_relative_eq!(automaton.tick(), 1.0);
        assert_eq!(automaton.current_state(), 1);
    }

    #[test]
    fn observations() {
        let forward = Rc::new(Probe::new(1.0));
        let stay = Rc::new(Probe::new(-1.0));
        let mut automaton = two_state(&forward, &stay, RewardConfig::default());

        assert_eq!(automaton.state_one_hot(), vec![1.0, 0.0]);
        automaton.tick();
        assert_eq!(automaton.state_one_hot(), vec![0.0, 1.0]);

        let graph = automaton.state_graph();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edge_weight(1, 1), Some(&1));
    }

    #[test]
    fn invalid_automata() {
        let accepting_only = vec![AutomatonState::new(
            "goal",
            vec![AutomatonEdge::new(Rc::new(True), 0, ["1"])],
        )];
        let dangling = vec![AutomatonState::new(
            "start",
            vec![AutomatonEdge::new(Rc::new(True), 3, ["1"])],
        )];

        assert_eq!(
            RewardAutomaton::new(Vec::new(), 0, pairs(), RewardConfig::default()).unwrap_err(),
            AutomatonBuildError::NoStates
        );
        assert_eq!(
            RewardAutomaton::new(accepting_only.clone(), 2, pairs(), RewardConfig::default())
                .unwrap_err(),
            AutomatonBuildError::InitialStateOutOfRange { index: 2, count: 1 }
        );
        assert_eq!(
            RewardAutomaton::new(accepting_only, 0, pairs(), RewardConfig::default()).unwrap_err(),
            AutomatonBuildError::NoProgressMetric
        );
        assert_eq!(
            RewardAutomaton::new(dangling, 0, pairs(), RewardConfig::default()).unwrap_err(),
            AutomatonBuildError::DestinationOutOfRange {
                state: 0,
                destination: 3,
                count: 1
            }
        );
    }
}
