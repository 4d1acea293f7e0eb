//! Pure generators over strings and alphabets: prefixes, suffixes, substrings and the
//! bounded Kleene/positive closures. All functions are deterministic and total for valid
//! input; the only fallible entry point is [`parse_closure_length`], which is where the
//! raw text of a caller becomes a bound.

use itertools::Itertools;

use crate::error::AutomatonError;

/// All prefixes of `s`, including the empty string and `s` itself, shortest first.
pub fn prefixes(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    (0..=chars.len())
        .map(|i| chars[..i].iter().collect())
        .collect()
}

/// All suffixes of `s`, including `s` itself and the empty string, ordered by increasing
/// start index. The first element is `s`, the last is empty.
pub fn suffixes(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    (0..=chars.len())
        .map(|i| chars[i..].iter().collect())
        .collect()
}

/// All contiguous non-empty substrings of `s`, ordered by increasing start index and then
/// increasing end index. Duplicates from repeated characters are kept, so `"aa"` yields
/// `["a", "aa", "a"]`. The count is always `n * (n + 1) / 2` for a string of `n` chars.
pub fn substrings(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let chars = &chars;
    (0..chars.len())
        .flat_map(|i| (i + 1..=chars.len()).map(move |j| chars[i..j].iter().collect()))
        .collect()
}

/// The bounded Kleene closure Σ*: every string of length `0..=max_len` over `alphabet`,
/// grouped by increasing length. Symbols are enumerated in the order supplied by the
/// caller, with the last position varying fastest. The empty string is always included;
/// an empty alphabet therefore yields exactly `[""]`.
pub fn kleene_closure<S: AsRef<str>>(alphabet: &[S], max_len: usize) -> Vec<String> {
    let mut result = vec![String::new()];
    result.extend(words_of_lengths(alphabet, 1, max_len));
    result
}

/// The bounded positive closure Σ+: every string of length `1..=max_len` over `alphabet`.
/// Identical to [`kleene_closure`] minus the empty string; an empty alphabet yields `[]`.
pub fn positive_closure<S: AsRef<str>>(alphabet: &[S], max_len: usize) -> Vec<String> {
    words_of_lengths(alphabet, 1, max_len)
}

fn words_of_lengths<S: AsRef<str>>(alphabet: &[S], from: usize, to: usize) -> Vec<String> {
    let symbols: Vec<&str> = alphabet.iter().map(AsRef::as_ref).collect();
    let mut out = Vec::new();
    for len in from..=to {
        out.extend(
            std::iter::repeat(symbols.iter().copied())
                .take(len)
                .multi_cartesian_product()
                .map(|word| word.concat()),
        );
    }
    out
}

/// Parses a closure length bound from raw caller text. Rejects non-numeric input and
/// negative values with [`AutomatonError::InvalidArgument`].
pub fn parse_closure_length(raw: &str) -> Result<usize, AutomatonError> {
    let raw = raw.trim();
    let value: i64 = raw
        .parse()
        .map_err(|_| AutomatonError::InvalidArgument(format!("`{raw}` is not a number")))?;
    usize::try_from(value)
        .map_err(|_| AutomatonError::InvalidArgument(format!("length must be non-negative, got {value}")))
}

/// Splits a comma-separated list as entered in a text field, trimming whitespace and
/// dropping blank entries.
pub fn split_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
