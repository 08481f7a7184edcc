use std::fmt::{Display, Formatter};

use petgraph::algo::dijkstra;
use petgraph::graphmap::DiGraphMap;

use super::{is_accepting_state, AcceptancePair, AutomatonState};

/// Number of transitions separating a state from the nearest accepting state.
///
/// `Finite` distances order before `Infinite`, so the derived ordering can be used directly to
/// compare progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Distance {
    Finite(u32),
    Infinite,
}

impl Distance {
    pub fn finite(self) -> Option<u32> {
        match self {
            Self::Finite(hops) => Some(hops),
            Self::Infinite => None,
        }
    }

    pub fn is_finite(self) -> bool {
        matches!(self, Self::Finite(_))
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finite(hops) => write!(f, "{}", hops),
            Self::Infinite => write!(f, "inf"),
        }
    }
}

/// Shortest distance from every state to an accepting state, and the largest finite distance.
///
/// The search runs backwards from a virtual goal node wired to every accepting state, so each state
/// receives its true minimum regardless of the cycles it sits on. States from which no accepting
/// state can be reached are `Infinite` and are ignored by the maximum.
pub(crate) fn distances_to_goal(
    states: &[AutomatonState],
    pairs: &[AcceptancePair],
) -> (Vec<Distance>, u32) {
    let goal = states.len();
    let mut reversed = DiGraphMap::<usize, ()>::new();

    for (index, state) in states.iter().enumerate() {
        reversed.add_node(index);

        for edge in &state.transitions {
            reversed.add_edge(edge.end_state, index, ());
        }

        if is_accepting_state(pairs, state) {
            reversed.add_edge(goal, index, ());
        }
    }

    reversed.add_node(goal);

    let hops = dijkstra(&reversed, goal, None, |(source, _, _)| u32::from(source != goal));

    let distances: Vec<Distance> = (0..states.len())
        .map(|index| hops.get(&index).map_or(Distance::Infinite, |hops| Distance::Finite(*hops)))
        .collect();

    let max_distance = distances
        .iter()
        .filter_map(|distance| distance.finite())
        .max()
        .unwrap_or(0);

    (distances, max_distance)
}
