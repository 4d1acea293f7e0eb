//! The JFLAP-compatible `.jff` XML dialect. The structure is
//! `<structure type="fa"><automaton>` containing `<state id="0" name="q0">` elements
//! (with `<x>`, `<y>` layout children and `<initial/>`/`<final/>` markers) and
//! `<transition>` elements whose `<from>`/`<to>` children reference state ids, not names.
//! An ε-transition is written with an empty `<read/>`.
//!
//! The dialect is simple enough that this module scans the XML with its own small tag
//! scanner; only the five standard entities are escaped and unescaped.

use itertools::Itertools;
use std::fmt::Write;
use tracing::{trace, warn};

use crate::automaton::{Automaton, Mode, EPSILON};
use crate::error::AutomatonError;
use crate::math::{Bijection, OrderedSet, Set};

/// Serializes the automaton as a JFLAP `.jff` document. State ids are assigned by the
/// iteration order of the state set and layout coordinates follow a fixed grid; neither
/// is part of the format contract, they only have to be deterministic.
pub fn encode(aut: &Automaton) -> String {
    let ids: Bijection<String, usize> = aut
        .states()
        .iter()
        .enumerate()
        .map(|(i, q)| (q.clone(), i))
        .collect();

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<structure type=\"fa\">\n  <automaton>\n");

    for (i, state) in aut.states().iter().enumerate() {
        let _ = write!(
            out,
            "    <state id=\"{i}\" name=\"{}\">\n      <x>{}</x>\n      <y>{}</y>\n",
            escape(state),
            (i % 5) * 100 + 50,
            (i / 5) * 100 + 50,
        );
        if aut.initial() == Some(state.as_str()) {
            out.push_str("      <initial/>\n");
        }
        if aut.is_accepting(state) {
            out.push_str("      <final/>\n");
        }
        out.push_str("    </state>\n");
    }

    for (from, symbol, dest) in aut.transitions() {
        for to in dest.states() {
            let (Some(from_id), Some(to_id)) = (ids.get_by_left(from), ids.get_by_left(&to))
            else {
                // endpoints are always members of the state set
                continue;
            };
            let read = if symbol == EPSILON {
                "<read/>".to_string()
            } else {
                format!("<read>{}</read>", escape(symbol))
            };
            let _ = write!(
                out,
                "    <transition>\n      <from>{from_id}</from>\n      <to>{to_id}</to>\n      {read}\n    </transition>\n",
            );
        }
    }

    out.push_str("  </automaton>\n</structure>\n");
    trace!("encoded automaton into a {} byte jff document", out.len());
    out
}

/// Parses an automaton from a JFLAP `.jff` document. State names are taken from the
/// `name` attribute, falling back to the `id`. The alphabet is collected from all
/// non-empty `<read>` texts. The automaton is an NFA iff some (from, symbol) pair is
/// defined by more than one `<transition>` element or some transition reads ε.
pub fn decode(input: &str) -> Result<Automaton, AutomatonError> {
    let root = parse_document(input)?;
    if root.name != "structure" {
        return Err(AutomatonError::Parse(format!(
            "expected <structure> root, got <{}>",
            root.name
        )));
    }
    let automaton = root
        .find_child("automaton")
        .ok_or_else(|| AutomatonError::Parse("missing <automaton> element".to_string()))?;

    let mut ids: Bijection<String, String> = Bijection::new();
    let mut states = OrderedSet::default();
    let mut initial = None;
    let mut accepting = Vec::new();

    for state in automaton.children.iter().filter(|c| c.name == "state") {
        let id = state
            .attr("id")
            .ok_or_else(|| AutomatonError::Parse("<state> without id".to_string()))?
            .to_string();
        let name = state.attr("name").unwrap_or(&id).to_string();
        if !states.insert(name.clone()) {
            warn!("duplicate state name {name}, keeping first occurrence");
        }
        if state.find_child("initial").is_some() {
            initial = Some(name.clone());
        }
        if state.find_child("final").is_some() {
            accepting.push(name.clone());
        }
        ids.insert(id, name);
    }

    let mut alphabet = OrderedSet::default();
    let mut triples = Vec::new();
    let mut seen: Set<(String, String)> = Set::default();
    let mut nondeterministic = false;

    for trans in automaton.children.iter().filter(|c| c.name == "transition") {
        let from_id = child_text(trans, "from")?;
        let to_id = child_text(trans, "to")?;
        let from = ids
            .get_by_left(&from_id)
            .ok_or_else(|| AutomatonError::Parse(format!("transition from unknown id `{from_id}`")))?
            .clone();
        let to = ids
            .get_by_left(&to_id)
            .ok_or_else(|| AutomatonError::Parse(format!("transition to unknown id `{to_id}`")))?
            .clone();
        let symbol = match trans.find_child("read").map(|r| r.text.trim()) {
            None | Some("") => EPSILON.to_string(),
            Some(text) => {
                let text = unescape(text);
                alphabet.insert(text.clone());
                text
            }
        };
        if symbol == EPSILON || !seen.insert((from.clone(), symbol.clone())) {
            nondeterministic = true;
        }
        triples.push((from, symbol, to));
    }

    let mut aut = Automaton::new(if nondeterministic { Mode::Nfa } else { Mode::Dfa });
    aut.set_alphabet(alphabet);
    aut.set_states(states);
    if let Some(initial) = initial {
        aut.set_initial(&initial)
            .map_err(|e| AutomatonError::Parse(e.to_string()))?;
    }
    for state in accepting {
        aut.toggle_accepting(&state, true)
            .map_err(|e| AutomatonError::Parse(e.to_string()))?;
    }
    for (from, symbol, to) in triples {
        aut.set_transition(&from, &symbol, &to)
            .map_err(|e| AutomatonError::Parse(e.to_string()))?;
    }
    Ok(aut)
}

fn child_text(element: &Element, name: &str) -> Result<String, AutomatonError> {
    element
        .find_child(name)
        .map(|c| unescape(c.text.trim()))
        .ok_or_else(|| AutomatonError::Parse(format!("<transition> without <{name}>")))
}

// ---- minimal XML subset scanner -------------------------------------------------------

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Parses a document into its root element. Processing instructions, comments and
/// doctype declarations are skipped; mismatched or unterminated tags are parse errors.
fn parse_document(input: &str) -> Result<Element, AutomatonError> {
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        if let Some(parent) = stack.last_mut() {
            parent.text.push_str(&rest[..lt]);
        }
        rest = &rest[lt..];

        if rest.starts_with("<?") {
            rest = skip_past(rest, "?>")?;
            continue;
        }
        if rest.starts_with("<!--") {
            rest = skip_past(rest, "-->")?;
            continue;
        }
        if rest.starts_with("<!") {
            rest = skip_past(rest, ">")?;
            continue;
        }

        let gt = rest
            .find('>')
            .ok_or_else(|| AutomatonError::Parse("unterminated tag".to_string()))?;
        let tag = &rest[1..gt];
        rest = &rest[gt + 1..];

        if let Some(name) = tag.strip_prefix('/') {
            let element = stack
                .pop()
                .ok_or_else(|| AutomatonError::Parse(format!("stray closing tag </{name}>")))?;
            if element.name != name.trim() {
                return Err(AutomatonError::Parse(format!(
                    "mismatched closing tag </{}> for <{}>",
                    name.trim(),
                    element.name
                )));
            }
            attach(&mut stack, &mut root, element)?;
        } else {
            let self_closing = tag.ends_with('/');
            let tag = tag.strip_suffix('/').unwrap_or(tag);
            let element = parse_tag(tag)?;
            if self_closing {
                attach(&mut stack, &mut root, element)?;
            } else {
                stack.push(element);
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(AutomatonError::Parse(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| AutomatonError::Parse("document contains no element".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), AutomatonError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(AutomatonError::Parse(
                "multiple root elements".to_string(),
            ))
        }
    }
    Ok(())
}

fn parse_tag(tag: &str) -> Result<Element, AutomatonError> {
    let tag = tag.trim();
    let name_end = tag
        .find(char::is_whitespace)
        .unwrap_or(tag.len());
    let (name, mut attrs_part) = tag.split_at(name_end);
    if name.is_empty() {
        return Err(AutomatonError::Parse("tag without a name".to_string()));
    }

    let mut element = Element {
        name: name.to_string(),
        ..Default::default()
    };
    loop {
        attrs_part = attrs_part.trim_start();
        if attrs_part.is_empty() {
            break;
        }
        let eq = attrs_part
            .find('=')
            .ok_or_else(|| AutomatonError::Parse(format!("malformed attribute in <{name}>")))?;
        let key = attrs_part[..eq].trim().to_string();
        let value_part = attrs_part[eq + 1..].trim_start();
        let quote = value_part
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| AutomatonError::Parse(format!("unquoted attribute in <{name}>")))?;
        let close = value_part[1..]
            .find(quote)
            .ok_or_else(|| AutomatonError::Parse(format!("unterminated attribute in <{name}>")))?;
        element
            .attrs
            .push((key, unescape(&value_part[1..close + 1])));
        attrs_part = &value_part[close + 2..];
    }
    Ok(element)
}

fn skip_past<'a>(input: &'a str, marker: &str) -> Result<&'a str, AutomatonError> {
    input
        .find(marker)
        .map(|pos| &input[pos + marker.len()..])
        .ok_or_else(|| AutomatonError::Parse(format!("unterminated `{marker}` section")))
}

fn escape(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&apos;".to_string(),
            other => other.to_string(),
        })
        .join("")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
