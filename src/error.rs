use itertools::Itertools;
use std::collections::BTreeSet;

/// The closed set of errors that any operation of this crate can produce. Mutators reject
/// the single offending call without touching existing state, codec decoders return a fresh
/// value only on success, and simulation errors are carried inside [`crate::run::Run`]
/// together with the partial trace accumulated up to the failure point.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AutomatonError {
    /// A state was referenced that is not part of the automaton's state set.
    #[error("state `{0}` is not part of the automaton")]
    InvalidState(String),
    /// A transition was declared over a symbol that is not part of the alphabet.
    #[error("symbol `{0}` is not part of the alphabet")]
    InvalidSymbol(String),
    /// The simulated input contains a symbol outside the declared alphabet.
    #[error("input symbol `{0}` is outside the alphabet")]
    UnknownSymbol(String),
    /// The walk reached a configuration from which the next input symbol has no transition.
    /// This is a terminal rejection, distinguishable from halting in a non-accepting state.
    #[error("no transition on `{symbol}` from {}", .configuration.iter().join(", "))]
    NoTransition {
        /// The configuration the walk was in when it dead-ended.
        configuration: BTreeSet<String>,
        /// The input symbol for which no transition exists.
        symbol: String,
    },
    /// Simulation was attempted on an automaton without an initial state.
    #[error("the automaton has no initial state")]
    MissingInitial,
    /// A numeric argument could not be parsed or is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Malformed input to one of the codec decoders.
    #[error("parse error: {0}")]
    Parse(String),
}

impl AutomatonError {
    /// Helper for building a [`AutomatonError::NoTransition`] from any collection of states.
    pub fn no_transition<I: IntoIterator<Item = String>>(configuration: I, symbol: &str) -> Self {
        Self::NoTransition {
            configuration: configuration.into_iter().collect(),
            symbol: symbol.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AutomatonError;

    #[test]
    fn display_mentions_offender() {
        assert_eq!(
            AutomatonError::InvalidState("q7".to_string()).to_string(),
            "state `q7` is not part of the automaton"
        );
        let err = AutomatonError::no_transition(["q0".to_string(), "q1".to_string()], "b");
        assert_eq!(err.to_string(), "no transition on `b` from q0, q1");
    }
}
