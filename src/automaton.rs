use std::collections::BTreeSet;

use tracing::trace;

use crate::error::AutomatonError;
use crate::math::{OrderedMap, OrderedSet};

/// The reserved symbol denoting the empty-input (epsilon) transition. It never appears in a
/// declared alphabet but is a legal transition label while the automaton is in NFA mode.
pub const EPSILON: &str = "ε";

/// Determines the shape that transition destinations take, see [`Destination`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum Mode {
    /// Deterministic: at most one destination per (state, symbol) pair, no ε-transitions.
    #[default]
    Dfa,
    /// Non-deterministic: a destination set per (state, symbol) pair, ε-transitions allowed.
    Nfa,
}

/// The destination of a transition. A DFA stores a single target state, an NFA stores a set
/// of target states. The variant in use is governed by the automaton's [`Mode`]; explicit
/// conversion happens in [`Automaton::set_mode`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Destination {
    /// A single target state (DFA mode).
    Single(String),
    /// A set of target states (NFA mode). May be empty, meaning no transition is defined.
    Multiple(BTreeSet<String>),
}

impl Destination {
    /// Returns the destination states as an ordered set, regardless of variant.
    pub fn states(&self) -> BTreeSet<String> {
        match self {
            Destination::Single(q) => BTreeSet::from([q.clone()]),
            Destination::Multiple(qs) => qs.clone(),
        }
    }

    /// Returns true if no target state is stored.
    pub fn is_empty(&self) -> bool {
        match self {
            Destination::Single(_) => false,
            Destination::Multiple(qs) => qs.is_empty(),
        }
    }

    fn retain_states(&mut self, keep: &OrderedSet<String>) -> bool {
        match self {
            Destination::Single(q) => keep.contains(q),
            Destination::Multiple(qs) => {
                qs.retain(|q| keep.contains(q));
                !qs.is_empty()
            }
        }
    }
}

/// A finite automaton over symbol strings. States are opaque names, the transition relation
/// maps (state, symbol) pairs to a [`Destination`] whose shape follows the current [`Mode`].
///
/// The aggregate is constructed empty and mutated incrementally. Wholesale redefinition of
/// the state set cascades into the initial state, the accepting set and the transition
/// table, so the invariant that every referenced state is a member of `states` always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Automaton {
    alphabet: OrderedSet<String>,
    states: OrderedSet<String>,
    initial: Option<String>,
    accepting: OrderedSet<String>,
    mode: Mode,
    transitions: OrderedMap<(String, String), Destination>,
}

impl Automaton {
    /// Creates an empty automaton in the given mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// The declared alphabet, in declaration order. Never contains [`EPSILON`].
    pub fn alphabet(&self) -> &OrderedSet<String> {
        &self.alphabet
    }

    /// The state set, in declaration order.
    pub fn states(&self) -> &OrderedSet<String> {
        &self.states
    }

    /// The initial state, if one is set.
    pub fn initial(&self) -> Option<&str> {
        self.initial.as_deref()
    }

    /// The accepting states.
    pub fn accepting(&self) -> &OrderedSet<String> {
        &self.accepting
    }

    /// The current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Iterates over the transition table in insertion order.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &str, &Destination)> + '_ {
        self.transitions
            .iter()
            .map(|((q, a), d)| (q.as_str(), a.as_str(), d))
    }

    /// Returns the destination stored for the given (state, symbol) pair, if any.
    pub fn destination(&self, from: &str, symbol: &str) -> Option<&Destination> {
        self.transitions
            .get(&(from.to_string(), symbol.to_string()))
    }

    /// Returns true if `state` belongs to the state set.
    pub fn contains_state(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    /// Returns true if `symbol` belongs to the declared alphabet.
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.alphabet.contains(symbol)
    }

    /// Returns true if `state` is accepting.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accepting.contains(state)
    }

    /// Replaces the alphabet wholesale. Blank symbols and [`EPSILON`] are skipped, the
    /// remaining symbols are deduplicated while keeping their order. Existing transitions
    /// are not validated against the new alphabet; stale entries surface at the next
    /// completeness check or simulation.
    pub fn set_alphabet<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alphabet = symbols
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty() && s != EPSILON)
            .collect();
    }

    /// Replaces the state set wholesale and cascades: an initial state that is no longer a
    /// member becomes unset, the accepting set is filtered, and every transition with an
    /// endpoint outside the new set is dropped.
    pub fn set_states<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = names
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();

        if let Some(initial) = self.initial.take() {
            if self.states.contains(&initial) {
                self.initial = Some(initial);
            } else {
                trace!("initial state {initial} vanished, unsetting");
            }
        }
        self.accepting.retain(|q| self.states.contains(q));

        let states = &self.states;
        self.transitions
            .retain(|(from, _), dest| states.contains(from) && dest.retain_states(states));
    }

    /// Sets the initial state. Fails if `state` is not a member of the state set.
    pub fn set_initial(&mut self, state: &str) -> Result<(), AutomatonError> {
        if !self.states.contains(state) {
            return Err(AutomatonError::InvalidState(state.to_string()));
        }
        self.initial = Some(state.to_string());
        Ok(())
    }

    /// Marks or unmarks `state` as accepting. Fails if `state` is not a member of the
    /// state set.
    pub fn toggle_accepting(&mut self, state: &str, is_accepting: bool) -> Result<(), AutomatonError> {
        if !self.states.contains(state) {
            return Err(AutomatonError::InvalidState(state.to_string()));
        }
        if is_accepting {
            self.accepting.insert(state.to_string());
        } else {
            self.accepting.shift_remove(state);
        }
        Ok(())
    }

    /// Declares a transition from `from` on `symbol` to `to`. In DFA mode this replaces any
    /// prior destination for the pair, in NFA mode `to` is added to the destination set.
    /// A blank `to` removes the (from, symbol) entry entirely. The symbol must belong to
    /// the alphabet; [`EPSILON`] is implicitly valid in NFA mode and rejected in DFA mode.
    pub fn set_transition(
        &mut self,
        from: &str,
        symbol: &str,
        to: &str,
    ) -> Result<(), AutomatonError> {
        if !self.states.contains(from) {
            return Err(AutomatonError::InvalidState(from.to_string()));
        }
        let epsilon_ok = symbol == EPSILON && matches!(self.mode, Mode::Nfa);
        if !epsilon_ok && !self.alphabet.contains(symbol) {
            return Err(AutomatonError::InvalidSymbol(symbol.to_string()));
        }

        let key = (from.to_string(), symbol.to_string());
        let to = to.trim();
        if to.is_empty() {
            self.transitions.shift_remove(&key);
            return Ok(());
        }
        if !self.states.contains(to) {
            return Err(AutomatonError::InvalidState(to.to_string()));
        }

        match self.mode {
            Mode::Dfa => {
                self.transitions.insert(key, Destination::Single(to.to_string()));
            }
            Mode::Nfa => {
                let dest = self
                    .transitions
                    .entry(key)
                    .or_insert_with(|| Destination::Multiple(BTreeSet::new()));
                match dest {
                    Destination::Multiple(qs) => {
                        qs.insert(to.to_string());
                    }
                    // Entries normally hold the variant matching the current mode, but a
                    // stray single destination is upgraded rather than clobbered.
                    Destination::Single(q) => {
                        let mut qs = BTreeSet::from([q.clone()]);
                        qs.insert(to.to_string());
                        *dest = Destination::Multiple(qs);
                    }
                }
            }
        }
        Ok(())
    }

    /// Switches the mode, converting the stored transitions. DFA→NFA wraps every single
    /// destination in a singleton set. NFA→DFA is lossy: every ε-transition is dropped,
    /// every destination set collapses to its lexicographically first element (empty sets
    /// are removed). No determinization is attempted.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        match mode {
            Mode::Nfa => {
                for dest in self.transitions.values_mut() {
                    if let Destination::Single(q) = dest {
                        *dest = Destination::Multiple(BTreeSet::from([q.clone()]));
                    }
                }
            }
            Mode::Dfa => {
                let mut collapsed = OrderedMap::default();
                for ((from, symbol), dest) in std::mem::take(&mut self.transitions) {
                    if symbol == EPSILON {
                        trace!("dropping ε-transition from {from} during NFA→DFA switch");
                        continue;
                    }
                    let first = match dest {
                        Destination::Single(q) => Some(q),
                        Destination::Multiple(qs) => qs.into_iter().next(),
                    };
                    if let Some(q) = first {
                        collapsed.insert((from, symbol), Destination::Single(q));
                    }
                }
                self.transitions = collapsed;
            }
        }
        self.mode = mode;
    }

    /// In DFA mode, returns true iff every (state, symbol) pair over the declared alphabet
    /// has a destination. Completeness is only demanded at export/validation time, so an
    /// automaton under construction may be incomplete. In NFA mode there is no completeness
    /// requirement and this returns true.
    pub fn is_complete(&self) -> bool {
        match self.mode {
            Mode::Nfa => true,
            Mode::Dfa => self.states.iter().all(|q| {
                self.alphabet
                    .iter()
                    .all(|a| self.destination(q, a).is_some())
            }),
        }
    }

    /// Checks that the automaton is well-defined for simulation and export: an initial
    /// state must be set and a DFA must be complete.
    pub fn validate(&self) -> Result<(), AutomatonError> {
        if self.initial.is_none() {
            return Err(AutomatonError::MissingInitial);
        }
        if let Mode::Dfa = self.mode {
            for q in &self.states {
                for a in &self.alphabet {
                    if self.destination(q, a).is_none() {
                        return Err(AutomatonError::no_transition([q.clone()], a));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_dfa() -> Automaton {
        let mut aut = Automaton::new(Mode::Dfa);
        aut.set_alphabet(["a", "b"]);
        aut.set_states(["q0", "q1"]);
        aut.set_initial("q0").unwrap();
        aut.toggle_accepting("q1", true).unwrap();
        aut.set_transition("q0", "a", "q1").unwrap();
        aut.set_transition("q0", "b", "q0").unwrap();
        aut.set_transition("q1", "a", "q1").unwrap();
        aut.set_transition("q1", "b", "q0").unwrap();
        aut
    }

    #[test]
    fn epsilon_never_enters_declared_alphabet() {
        let mut aut = Automaton::new(Mode::Nfa);
        aut.set_alphabet(["a", EPSILON, "", "b"]);
        assert_eq!(
            aut.alphabet().iter().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn mutators_reject_unknown_references() {
        let mut aut = two_state_dfa();
        assert_eq!(
            aut.set_initial("q9"),
            Err(AutomatonError::InvalidState("q9".to_string()))
        );
        assert_eq!(
            aut.set_transition("q0", "c", "q1"),
            Err(AutomatonError::InvalidSymbol("c".to_string()))
        );
        assert_eq!(
            aut.set_transition("q0", "a", "q9"),
            Err(AutomatonError::InvalidState("q9".to_string()))
        );
        // ε is only implicitly valid in NFA mode.
        assert_eq!(
            aut.set_transition("q0", EPSILON, "q1"),
            Err(AutomatonError::InvalidSymbol(EPSILON.to_string()))
        );
        // the rejected calls left the automaton untouched
        assert_eq!(aut, two_state_dfa());
    }

    #[test]
    fn blank_destination_removes_entry() {
        let mut aut = two_state_dfa();
        assert!(aut.is_complete());
        aut.set_transition("q0", "a", "  ").unwrap();
        assert!(aut.destination("q0", "a").is_none());
        assert!(!aut.is_complete());
    }

    #[test]
    fn nfa_transitions_accumulate() {
        let mut aut = Automaton::new(Mode::Nfa);
        aut.set_alphabet(["a"]);
        aut.set_states(["q0", "q1", "q2"]);
        aut.set_transition("q0", "a", "q1").unwrap();
        aut.set_transition("q0", "a", "q2").unwrap();
        assert_eq!(
            aut.destination("q0", "a").unwrap().states(),
            BTreeSet::from(["q1".to_string(), "q2".to_string()])
        );
    }

    #[test]
    fn set_states_cascades() {
        let mut aut = two_state_dfa();
        aut.set_states(["q0"]);
        assert_eq!(aut.initial(), Some("q0"));
        assert!(aut.accepting().is_empty());
        // only the q0 --b--> q0 self loop survives
        assert_eq!(aut.transitions().count(), 1);
        assert!(aut.destination("q0", "b").is_some());
        assert!(!aut.is_complete());

        aut.set_states(["p0", "p1"]);
        assert_eq!(aut.initial(), None);
        assert_eq!(aut.transitions().count(), 0);
        assert_eq!(aut.validate(), Err(AutomatonError::MissingInitial));
    }

    #[test]
    fn mode_switch_round_trip_is_lossy() {
        let mut aut = Automaton::new(Mode::Nfa);
        aut.set_alphabet(["a"]);
        aut.set_states(["q0", "q1", "q2"]);
        aut.set_transition("q0", "a", "q2").unwrap();
        aut.set_transition("q0", "a", "q1").unwrap();
        aut.set_transition("q0", EPSILON, "q1").unwrap();

        aut.set_mode(Mode::Dfa);
        // ε dropped, destination set collapsed to its lexicographically first element
        assert_eq!(
            aut.destination("q0", "a"),
            Some(&Destination::Single("q1".to_string()))
        );
        assert!(aut.destination("q0", EPSILON).is_none());

        aut.set_mode(Mode::Nfa);
        assert_eq!(
            aut.destination("q0", "a").unwrap().states(),
            BTreeSet::from(["q1".to_string()])
        );
    }

    #[test]
    fn completeness_flips_when_last_entry_filled() {
        let mut aut = two_state_dfa();
        aut.set_transition("q1", "b", "").unwrap();
        assert!(!aut.is_complete());
        assert!(aut.validate().is_err());
        aut.set_transition("q1", "b", "q0").unwrap();
        assert!(aut.is_complete());
        assert!(aut.validate().is_ok());
    }
}
