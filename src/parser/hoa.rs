use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use nom::bytes::complete::{tag, take_until};
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, map_res, opt};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;
use thiserror::Error;

use super::guard::{parse_guard, GuardParseError};
use crate::automaton::{
    AcceptancePair, AutomatonDescription, StateDescription, TransitionDescription,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutomatonParseError {
    #[error("Missing \"{0}\" section")]
    MissingSection(&'static str),

    #[error("Line {line}: \"{section}\" must come after the \"States\" header")]
    OutOfOrder { line: usize, section: &'static str },

    #[error("Line {line}: {sets} acceptance sets declared but {pairs} Fin/Inf pairs found")]
    AcceptanceMismatch { line: usize, sets: usize, pairs: usize },

    #[error("Line {line}: initial state {index} is out of range for {count} states")]
    InitialStateOutOfRange { line: usize, index: usize, count: usize },

    #[error("Line {line}: state {index} is out of range for {count} states")]
    StateOutOfRange { line: usize, index: usize, count: usize },

    #[error("Line {line}: state {index} is declared twice")]
    DuplicateState { line: usize, index: usize },

    #[error("{declared} states declared but only {found} defined")]
    IncompleteStates { declared: usize, found: usize },

    #[error("Line {line}: transition before the first state")]
    TransitionBeforeState { line: usize },

    #[error("Line {line}: transition to state {destination}, only {count} states exist")]
    DestinationOutOfRange { line: usize, destination: usize, count: usize },

    #[error("Line {line}: invalid guard: {source}")]
    Guard {
        line: usize,
        #[source]
        source: GuardParseError,
    },

    #[error("Line {line}: malformed line \"{content}\"")]
    Malformed { line: usize, content: String },
}

fn number(input: &str) -> IResult<&str, usize> {
    map_res(digit1, usize::from_str)(input)
}

fn keyword<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| -> IResult<&'a str, &'a str> {
        let mut parser = terminated(tag(name), space0);
        parser(input)
    }
}

/// Header line consisting of `name` and a single count.
fn count_header<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, usize> {
    move |input: &'a str| -> IResult<&'a str, usize> {
        let mut parser = all_consuming(preceded(keyword(name), number));
        parser(input)
    }
}

fn rabin_pair(input: &str) -> IResult<&str, (usize, usize)> {
    let fin = delimited(tag("Fin("), number, char(')'));
    let inf = delimited(tag("Inf("), number, char(')'));
    let mut parser = separated_pair(fin, delimited(space0, char('&'), space0), inf);

    parser(input)
}

/// Every `Fin(i)&Inf(j)` conjunction in the acceptance condition, in order of appearance.
fn rabin_pairs(mut condition: &str) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();

    while let Some(start) = condition.find("Fin(") {
        match rabin_pair(&condition[start..]) {
            Ok((remaining, found)) => {
                pairs.push(found);
                condition = remaining;
            }
            Err(_) => condition = &condition[start + 4..],
        }
    }

    pairs
}

fn acceptance(input: &str) -> IResult<&str, (usize, Vec<(usize, usize)>)> {
    let (condition, sets) = preceded(keyword("Acceptance:"), number)(input)?;

    Ok(("", (sets, rabin_pairs(condition))))
}

fn state(input: &str) -> IResult<&str, (usize, Option<&str>)> {
    let label = delimited(char('"'), take_until("\""), char('"'));
    let mut parser = all_consuming(pair(
        preceded(keyword("State:"), number),
        opt(preceded(space1, label)),
    ));

    parser(input)
}

fn transition(input: &str) -> IResult<&str, (&str, usize, Option<&str>)> {
    let guard = delimited(char('['), take_until("]"), char(']'));
    let tokens = delimited(char('{'), take_until("}"), char('}'));
    let mut parser = all_consuming(tuple((
        guard,
        preceded(space1, number),
        opt(preceded(space0, tokens)),
    )));

    parser(input)
}

#[derive(Default)]
struct Header {
    states: Option<usize>,
    start: Option<(usize, usize)>,
    acceptance: Option<Vec<AcceptancePair>>,
}

/// Parse the HOA subset emitted for Rabin automata with transition-based acceptance.
///
/// The header must contain `States:` followed by `Acceptance:`, with `k` pairs of the form
/// `Fin(i)&Inf(j)` for `2k` acceptance sets. An optional `Start:` line selects the initial state,
/// which is `0` otherwise. Other header lines are ignored. The body lists each state as
/// `State: <index> "<label>"` followed by its transitions `[<guard>] <destination> {<sets>}` and is
/// closed by `--END--`. The state label and the acceptance-set block are optional. Any malformed
/// line fails the whole parse.
///
/// ```rust
/// use tltl_reward::parser::parse_automaton;
///
/// let text = "HOA: v1\nStates: 2\nStart: 0\nAcceptance: 2 Fin(0)&Inf(1)\n--BODY--\n\
///             State: 0 \"wait\"\n[!0] 0\n[0] 1\nState: 1 \"done\"\n[t] 1 {1}\n--END--\n";
/// let automaton = parse_automaton(text).unwrap();
///
/// assert_eq!(automaton.states.len(), 2);
/// assert_eq!(automaton.acceptance_pairs.len(), 1);
/// assert_eq!(automaton.transition_count(), 3);
/// ```
pub fn parse_automaton(input: &str) -> Result<AutomatonDescription, AutomatonParseError> {
    let mut lines = input.lines().enumerate().map(|(index, line)| (index + 1, line.trim()));
    let mut header = Header::default();
    let mut body_found = false;

    for (line, content) in lines.by_ref() {
        if content == "--BODY--" {
            body_found = true;
            break;
        }

        if let Ok((_, count)) = count_header("States:")(content) {
            header.states = Some(count);
        } else if let Ok((_, index)) = count_header("Start:")(content) {
            header.start = Some((line, index));
        } else if content.starts_with("Acceptance:") {
            if header.states.is_none() {
                return Err(AutomatonParseError::OutOfOrder {
                    line,
                    section: "Acceptance",
                });
            }

            let (_, (sets, pairs)) =
                acceptance(content).map_err(|_| AutomatonParseError::Malformed {
                    line,
                    content: content.to_string(),
                })?;

            if pairs.len() * 2 != sets {
                return Err(AutomatonParseError::AcceptanceMismatch {
                    line,
                    sets,
                    pairs: pairs.len(),
                });
            }

            let pairs = pairs
                .into_iter()
                .map(|(fin, inf)| AcceptancePair::new([fin.to_string()], [inf.to_string()]))
                .collect();

            header.acceptance = Some(pairs);
        } else if content.starts_with("States:") || content.starts_with("Start:") {
            return Err(AutomatonParseError::Malformed {
                line,
                content: content.to_string(),
            });
        }
    }

    let count = header.states.ok_or(AutomatonParseError::MissingSection("States"))?;
    let acceptance_pairs = header
        .acceptance
        .ok_or(AutomatonParseError::MissingSection("Acceptance"))?;

    if !body_found {
        return Err(AutomatonParseError::MissingSection("--BODY--"));
    }

    let initial_state = match header.start {
        Some((line, index)) if index >= count => {
            return Err(AutomatonParseError::InitialStateOutOfRange { line, index, count })
        }
        Some((_, index)) => index,
        None => 0,
    };

    // Filled as states appear; the declared count is not trusted for allocation.
    let mut states: BTreeMap<usize, StateDescription> = BTreeMap::new();
    let mut current: Option<usize> = None;
    let mut end_found = false;

    for (line, content) in lines {
        if content.is_empty() {
            continue;
        }

        if content == "--END--" {
            end_found = true;
            break;
        }

        if let Ok((_, (index, label))) = state(content) {
            if index >= count {
                return Err(AutomatonParseError::StateOutOfRange { line, index, count });
            }

            if states.contains_key(&index) {
                return Err(AutomatonParseError::DuplicateState { line, index });
            }

            let label = label.unwrap_or_default().to_string();
            states.insert(
                index,
                StateDescription {
                    label,
                    transitions: Vec::new(),
                },
            );
            current = Some(index);
        } else if let Ok((_, (guard, destination, tokens))) = transition(content) {
            let source = current.ok_or(AutomatonParseError::TransitionBeforeState { line })?;

            if destination >= count {
                return Err(AutomatonParseError::DestinationOutOfRange {
                    line,
                    destination,
                    count,
                });
            }

            let guard =
                parse_guard(guard).map_err(|source| AutomatonParseError::Guard { line, source })?;
            let tokens = tokens
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect::<BTreeSet<_>>();

            if let Some(state) = states.get_mut(&source) {
                state.transitions.push(TransitionDescription {
                    guard,
                    destination,
                    tokens,
                });
            }
        } else {
            return Err(AutomatonParseError::Malformed {
                line,
                content: content.to_string(),
            });
        }
    }

    if !end_found {
        return Err(AutomatonParseError::MissingSection("--END--"));
    }

    // Every key is below `count`, so `count` distinct keys cover `0..count` in order.
    if states.len() != count {
        return Err(AutomatonParseError::IncompleteStates {
            declared: count,
            found: states.len(),
        });
    }

    let states = states.into_values().collect();

    Ok(AutomatonDescription {
        initial_state,
        acceptance_pairs,
        states,
    })
}

impl FromStr for AutomatonDescription {
    type Err = AutomatonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_automaton(s)
    }
}
