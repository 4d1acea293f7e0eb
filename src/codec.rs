//! Serialization of automata. Two independent, symmetric formats are supported: the
//! line-oriented native text format ([`native`]) and the JFLAP-compatible XML dialect
//! ([`jflap`]). Both codecs work on strings; reading and writing files is the caller's
//! concern. A failed decode returns an error and never touches previously-loaded state,
//! the caller substitutes the result only on success.

use crate::automaton::Automaton;
use crate::error::AutomatonError;

pub mod jflap;
pub mod native;

/// The on-disk formats an automaton can be exchanged in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Format {
    /// The line-oriented `.afd` text format.
    Native,
    /// The JFLAP-compatible `.jff` XML format.
    Jflap,
}

impl Format {
    /// Guesses the format from a file name extension, defaulting to [`Format::Native`].
    pub fn from_extension(file_name: &str) -> Self {
        match file_name.rsplit('.').next() {
            Some("jff") => Format::Jflap,
            _ => Format::Native,
        }
    }

    /// Serializes the automaton in this format.
    pub fn encode(&self, aut: &Automaton) -> String {
        match self {
            Format::Native => native::encode(aut),
            Format::Jflap => jflap::encode(aut),
        }
    }

    /// Deserializes an automaton from text in this format.
    pub fn decode(&self, input: &str) -> Result<Automaton, AutomatonError> {
        match self {
            Format::Native => native::decode(input),
            Format::Jflap => jflap::decode(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Format;

    #[test]
    fn format_guessing() {
        assert_eq!(Format::from_extension("machine.jff"), Format::Jflap);
        assert_eq!(Format::from_extension("machine.afd"), Format::Native);
        assert_eq!(Format::from_extension("machine"), Format::Native);
    }
}
