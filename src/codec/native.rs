//! The native line-oriented text format. One declarative line per field, followed by one
//! line per transition:
//!
//! ```text
//! Tipo: AFN
//! Alfabeto: a,b
//! Estados: q0,q1
//! Estado inicial: q0
//! Estados de aceptación: q1
//! Transición: q0,a->q0,q1
//! ```
//!
//! Parsing is tolerant: fields may appear in any order and unknown lines are skipped.
//! Repeated `Transición:` lines for the same (state, symbol) accumulate into the
//! destination set in NFA mode; in DFA mode the last line wins.

use itertools::Itertools;
use tracing::{trace, warn};

use crate::automaton::{Automaton, Mode, EPSILON};
use crate::error::AutomatonError;
use crate::word::split_symbol_list;

/// Serializes the automaton into the native text format.
pub fn encode(aut: &Automaton) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Tipo: {}\n",
        match aut.mode() {
            Mode::Nfa => "AFN",
            Mode::Dfa => "AFD",
        }
    ));
    out.push_str(&format!("Alfabeto: {}\n", aut.alphabet().iter().join(",")));
    out.push_str(&format!("Estados: {}\n", aut.states().iter().join(",")));
    out.push_str(&format!("Estado inicial: {}\n", aut.initial().unwrap_or("")));
    out.push_str(&format!(
        "Estados de aceptación: {}\n",
        aut.accepting().iter().join(",")
    ));
    for (from, symbol, dest) in aut.transitions() {
        out.push_str(&format!(
            "Transición: {from},{symbol}->{}\n",
            dest.states().iter().join(",")
        ));
    }
    trace!("encoded automaton into {} native format lines", out.lines().count());
    out
}

/// Parses an automaton from the native text format. `Alfabeto:` and `Estados:` lines are
/// required; a transition referencing an undeclared state or symbol is a parse error.
/// When no `Tipo:` line is present, the automaton is an NFA iff any transition line
/// carries several destinations or an ε symbol.
pub fn decode(input: &str) -> Result<Automaton, AutomatonError> {
    let mut mode = None;
    let mut alphabet = None;
    let mut states = None;
    let mut initial = None;
    let mut accepting = Vec::new();
    let mut transitions: Vec<(String, String, Vec<String>)> = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            warn!("skipping line without key: {line}");
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Tipo" => {
                mode = Some(if value.contains("AFN") { Mode::Nfa } else { Mode::Dfa });
            }
            "Alfabeto" => alphabet = Some(split_symbol_list(value)),
            "Estados" => states = Some(split_symbol_list(value)),
            "Estado inicial" => {
                if !value.is_empty() {
                    initial = Some(value.to_string());
                }
            }
            "Estados de aceptación" => accepting = split_symbol_list(value),
            "Transición" => transitions.push(parse_transition_line(value)?),
            other => trace!("ignoring unknown field `{other}`"),
        }
    }

    let alphabet =
        alphabet.ok_or_else(|| AutomatonError::Parse("missing `Alfabeto:` line".to_string()))?;
    let states =
        states.ok_or_else(|| AutomatonError::Parse("missing `Estados:` line".to_string()))?;

    // without an explicit Tipo line, nondeterminism is inferred from the transitions
    let mode = mode.unwrap_or_else(|| {
        let nondeterministic = transitions
            .iter()
            .any(|(_, symbol, dests)| symbol == EPSILON || dests.len() > 1);
        if nondeterministic {
            Mode::Nfa
        } else {
            Mode::Dfa
        }
    });

    let mut aut = Automaton::new(mode);
    aut.set_alphabet(alphabet);
    aut.set_states(states);
    if let Some(initial) = initial {
        aut.set_initial(&initial)
            .map_err(|_| dangling("initial state", &initial))?;
    }
    for state in accepting {
        aut.toggle_accepting(&state, true)
            .map_err(|_| dangling("accepting state", &state))?;
    }
    for (from, symbol, dests) in transitions {
        for to in dests {
            aut.set_transition(&from, &symbol, &to).map_err(|e| match e {
                AutomatonError::InvalidSymbol(s) => dangling("transition symbol", &s),
                AutomatonError::InvalidState(s) => dangling("transition state", &s),
                other => other,
            })?;
        }
    }
    Ok(aut)
}

fn parse_transition_line(value: &str) -> Result<(String, String, Vec<String>), AutomatonError> {
    let (source, targets) = value
        .split_once("->")
        .ok_or_else(|| AutomatonError::Parse(format!("malformed transition `{value}`")))?;
    let source_parts = split_symbol_list(source);
    let [from, symbol] = source_parts.as_slice() else {
        return Err(AutomatonError::Parse(format!(
            "transition source must be `state,symbol`, got `{source}`"
        )));
    };
    Ok((from.clone(), symbol.clone(), split_symbol_list(targets)))
}

fn dangling(what: &str, name: &str) -> AutomatonError {
    AutomatonError::Parse(format!("{what} `{name}` is not declared"))
}
