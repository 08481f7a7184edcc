//! Parsers for the text produced by the external LTL to automaton converter.
//!
//! [`parse_automaton`] reads the HOA subset describing a Rabin automaton with transition-based
//! acceptance, and [`parse_guard`] reads the boolean guard expressions that label its transitions.

mod guard;
mod hoa;

pub use guard::{parse_guard, GuardParseError};
pub use hoa::{parse_automaton, AutomatonParseError};
