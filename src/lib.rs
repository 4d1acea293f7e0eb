//! Engine for defining, simulating and serializing finite automata.
//!
//! An [`automaton::Automaton`] aggregates an alphabet, a state set, an optional initial
//! state, a set of accepting states and a transition relation. The relation is shaped by
//! the automaton's [`automaton::Mode`]: a DFA stores at most one destination per
//! (state, symbol) pair, an NFA stores destination sets and may use ε-transitions. The
//! aggregate is built up incrementally through mutators that reject invalid references
//! without corrupting existing state, and is read-only during simulation.
//!
//! [`run::run`] executes an input string against an automaton, producing an acceptance
//! verdict together with a step-by-step trace; non-deterministic automata are walked as a
//! subset construction with ε-closure expansion. [`word`] collects the pure language
//! generators (prefixes, suffixes, substrings and the bounded closures) and [`codec`]
//! holds the two serialization formats, a native line-oriented text format and a
//! JFLAP-compatible XML dialect.
//!
//! This crate is the synchronous, single-threaded core of a simulator application: every
//! operation runs to completion before returning and the single automaton instance is
//! owned exclusively by the calling context. File handling, user input collection and all
//! presentation concerns live outside.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use afsim::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        automaton::{Automaton, Destination, Mode, EPSILON},
        codec::{self, Format},
        error::AutomatonError,
        math,
        run::{epsilon_closure, epsilon_closure_of, run, run_batch, Run, Step},
        word,
    };
}

/// This module contains type aliases for the collection types used throughout the crate.
pub mod math;

/// The closed error enumeration shared by all operations.
pub mod error;

/// The automaton data model and its mutators.
pub mod automaton;

/// Simulation of input strings against an automaton.
pub mod run;

/// Pure string and language generators.
pub mod word;

/// Import and export codecs for the supported on-disk formats.
pub mod codec;
