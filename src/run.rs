use std::collections::BTreeSet;

use tracing::trace;

use crate::automaton::{Automaton, Mode, EPSILON};
use crate::error::AutomatonError;
use crate::math::Set;

/// One step of a run: the configuration before consuming `symbol` and the configuration
/// after. Configurations are ordered sets, so the states within one are listed
/// lexicographically. For a DFA walk both sides are singletons.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Step {
    /// The configuration the walk was in before consuming the symbol.
    pub from: BTreeSet<String>,
    /// The consumed input symbol.
    pub symbol: String,
    /// The configuration reached by consuming the symbol.
    pub to: BTreeSet<String>,
}

impl Step {
    fn new<I, J>(from: I, symbol: &str, to: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            from: from.into_iter().collect(),
            symbol: symbol.to_string(),
            to: to.into_iter().collect(),
        }
    }
}

/// The outcome of simulating an input string. Even a failed run carries the trace that was
/// accumulated up to the failure point, so a caller can display "got this far, then failed".
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Run {
    /// Whether the input was accepted.
    pub accepted: bool,
    /// The ordered sequence of steps taken.
    pub trace: Vec<Step>,
    /// Set if the walk terminated abnormally; acceptance is then always false.
    pub error: Option<AutomatonError>,
}

impl Run {
    fn rejected(trace: Vec<Step>, error: AutomatonError) -> Self {
        Self {
            accepted: false,
            trace,
            error: Some(error),
        }
    }
}

/// Simulates `input` against the automaton. Input is consumed one character at a time and
/// each character is looked up as an alphabet symbol. A DFA is walked as a single current
/// state, an NFA as a subset construction with ε-closure expansion after every step.
pub fn run(aut: &Automaton, input: &str) -> Run {
    let Some(initial) = aut.initial() else {
        return Run::rejected(Vec::new(), AutomatonError::MissingInitial);
    };
    match aut.mode() {
        Mode::Dfa => run_deterministic(aut, initial, input),
        Mode::Nfa => run_nondeterministic(aut, initial, input),
    }
}

/// Simulates every string of the batch, pairing each input with its [`Run`].
pub fn run_batch<I, S>(aut: &Automaton, inputs: I) -> Vec<(String, Run)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    inputs
        .into_iter()
        .map(Into::into)
        .map(|input| {
            let outcome = run(aut, &input);
            (input, outcome)
        })
        .collect()
}

fn run_deterministic(aut: &Automaton, initial: &str, input: &str) -> Run {
    let mut current = initial.to_string();
    let mut trace = Vec::new();

    for ch in input.chars() {
        let symbol = ch.to_string();
        if !aut.contains_symbol(&symbol) {
            return Run::rejected(trace, AutomatonError::UnknownSymbol(symbol));
        }
        let Some(dest) = aut.destination(&current, &symbol) else {
            return Run::rejected(
                trace,
                AutomatonError::no_transition([current.clone()], &symbol),
            );
        };
        // in DFA mode the table only ever stores single destinations, but an empty
        // set that slipped in through a mode switch counts as no transition
        let next = match dest.states().into_iter().next() {
            Some(q) => q,
            None => {
                return Run::rejected(
                    trace,
                    AutomatonError::no_transition([current.clone()], &symbol),
                )
            }
        };
        trace.push(Step::new([current.clone()], &symbol, [next.clone()]));
        current = next;
    }

    trace!("deterministic walk halted in {current}");
    Run {
        accepted: aut.is_accepting(&current),
        trace,
        error: None,
    }
}

fn run_nondeterministic(aut: &Automaton, initial: &str, input: &str) -> Run {
    let mut current = epsilon_closure(aut, [initial.to_string()]);
    let mut trace = Vec::new();

    for ch in input.chars() {
        let symbol = ch.to_string();
        if !aut.contains_symbol(&symbol) {
            return Run::rejected(trace, AutomatonError::UnknownSymbol(symbol));
        }

        let mut next = BTreeSet::new();
        for state in &current {
            if let Some(dest) = aut.destination(state, &symbol) {
                next.extend(dest.states());
            }
        }
        let next = epsilon_closure(aut, next);
        if next.is_empty() {
            return Run::rejected(
                trace,
                AutomatonError::no_transition(current.clone(), &symbol),
            );
        }

        trace.push(Step::new(current.clone(), &symbol, next.clone()));
        current = next;
    }

    trace!("subset walk halted in configuration of size {}", current.len());
    Run {
        accepted: current.iter().any(|q| aut.is_accepting(q)),
        trace,
        error: None,
    }
}

/// Computes the ε-closure of a set of states: everything reachable through zero or more
/// ε-transitions. Implemented as a work-list reachability fixpoint, so it terminates even
/// when the ε-transition graph contains cycles.
pub fn epsilon_closure<I>(aut: &Automaton, states: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    let mut closure: BTreeSet<String> = states.into_iter().collect();
    let mut frontier: Vec<String> = closure.iter().cloned().collect();
    let mut seen: Set<String> = closure.iter().cloned().collect();

    while let Some(state) = frontier.pop() {
        if let Some(dest) = aut.destination(&state, EPSILON) {
            for next in dest.states() {
                if seen.insert(next.clone()) {
                    closure.insert(next.clone());
                    frontier.push(next);
                }
            }
        }
    }
    closure
}

/// The ε-closure of a single state, exposed standalone for diagnostic display. Fails if
/// `state` is not part of the automaton.
pub fn epsilon_closure_of(aut: &Automaton, state: &str) -> Result<BTreeSet<String>, AutomatonError> {
    if !aut.contains_state(state) {
        return Err(AutomatonError::InvalidState(state.to_string()));
    }
    Ok(epsilon_closure(aut, [state.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Automaton, Mode, EPSILON};

    fn parity_dfa() -> Automaton {
        let mut aut = Automaton::new(Mode::Dfa);
        aut.set_alphabet(["a", "b"]);
        aut.set_states(["q0", "q1"]);
        aut.set_initial("q0").unwrap();
        aut.toggle_accepting("q1", true).unwrap();
        aut.set_transition("q0", "a", "q1").unwrap();
        aut.set_transition("q1", "a", "q1").unwrap();
        aut.set_transition("q0", "b", "q0").unwrap();
        aut.set_transition("q1", "b", "q0").unwrap();
        aut
    }

    fn epsilon_nfa() -> Automaton {
        let mut aut = Automaton::new(Mode::Nfa);
        aut.set_alphabet(["a"]);
        aut.set_states(["q0", "q1", "q2"]);
        aut.set_initial("q0").unwrap();
        aut.toggle_accepting("q2", true).unwrap();
        aut.set_transition("q0", EPSILON, "q1").unwrap();
        aut.set_transition("q1", "a", "q2").unwrap();
        aut
    }

    fn singleton(q: &str) -> BTreeSet<String> {
        BTreeSet::from([q.to_string()])
    }

    #[test_log::test]
    fn deterministic_walk_with_trace() {
        let aut = parity_dfa();

        let outcome = run(&aut, "aab");
        assert!(!outcome.accepted);
        assert!(outcome.error.is_none());
        assert_eq!(
            outcome.trace,
            vec![
                Step::new(["q0".to_string()], "a", ["q1".to_string()]),
                Step::new(["q1".to_string()], "a", ["q1".to_string()]),
                Step::new(["q1".to_string()], "b", ["q0".to_string()]),
            ]
        );

        assert!(run(&aut, "aa").accepted);
        // the empty input halts in the initial, non-accepting state
        assert!(!run(&aut, "").accepted);
    }

    #[test]
    fn unknown_symbol_truncates_trace() {
        let aut = parity_dfa();
        let outcome = run(&aut, "axb");
        assert!(!outcome.accepted);
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(
            outcome.error,
            Some(AutomatonError::UnknownSymbol("x".to_string()))
        );
    }

    #[test]
    fn missing_transition_is_terminal() {
        let mut aut = parity_dfa();
        aut.set_transition("q1", "b", "").unwrap();
        let outcome = run(&aut, "ab");
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(
            outcome.error,
            Some(AutomatonError::no_transition(["q1".to_string()], "b"))
        );
    }

    #[test]
    fn missing_initial_state() {
        let mut aut = parity_dfa();
        aut.set_states(["p0"]);
        let outcome = run(&aut, "a");
        assert_eq!(outcome.error, Some(AutomatonError::MissingInitial));
        assert!(outcome.trace.is_empty());
    }

    #[test_log::test]
    fn epsilon_expansion_before_first_symbol() {
        let aut = epsilon_nfa();
        assert_eq!(
            epsilon_closure_of(&aut, "q0").unwrap(),
            BTreeSet::from(["q0".to_string(), "q1".to_string()])
        );

        let outcome = run(&aut, "a");
        assert!(outcome.accepted);
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(
            outcome.trace[0].from,
            BTreeSet::from(["q0".to_string(), "q1".to_string()])
        );
        assert_eq!(outcome.trace[0].to, singleton("q2"));
    }

    #[test]
    fn epsilon_closure_terminates_on_cycles() {
        let mut aut = Automaton::new(Mode::Nfa);
        aut.set_alphabet(["a"]);
        aut.set_states(["q0", "q1"]);
        aut.set_transition("q0", EPSILON, "q1").unwrap();
        aut.set_transition("q1", EPSILON, "q0").unwrap();
        assert_eq!(
            epsilon_closure_of(&aut, "q0").unwrap(),
            BTreeSet::from(["q0".to_string(), "q1".to_string()])
        );
        assert_eq!(
            epsilon_closure_of(&aut, "zz"),
            Err(AutomatonError::InvalidState("zz".to_string()))
        );
    }

    #[test]
    fn dead_subset_configuration() {
        let mut aut = epsilon_nfa();
        aut.toggle_accepting("q2", true).unwrap();
        let outcome = run(&aut, "aa");
        assert!(!outcome.accepted);
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(
            outcome.error,
            Some(AutomatonError::no_transition(["q2".to_string()], "a"))
        );
    }

    #[test]
    fn batch_runs_pair_inputs_with_outcomes() {
        let aut = parity_dfa();
        let outcomes = run_batch(&aut, ["aa", "ab", "b"]);
        let accepted: Vec<_> = outcomes
            .iter()
            .filter(|(_, run)| run.accepted)
            .map(|(input, _)| input.as_str())
            .collect();
        assert_eq!(accepted, vec!["aa"]);
    }
}
