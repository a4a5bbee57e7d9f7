//! Match highlighting over original field text
//!
//! Wraps the surface form of every token whose normalized term matches a
//! query term. Non-matching text is preserved byte-for-byte; overlapping
//! marks from multiple query terms covering the same token collapse into
//! a single marked span. When nothing matches, the original text comes
//! back unchanged; callers use that fallback to distinguish "no
//! highlight" from "no match", it is not an error.

use std::collections::HashSet;
use vintry_analysis::tokenizer::{tokenize, tokenize_tokens};

/// Highlight query-term matches inside a field's text.
///
/// `query_terms` are surface forms (whole query words or phrases); they
/// are normalized through the same pipeline as the field text, so
/// "chewy" highlights the token "chewy" even though both index as
/// "chewi".
///
/// # Example
///
/// ```
/// use vintry_index::highlight::highlight;
///
/// let marked = highlight("This wine is raw, chewy.", ["chewy"], "<mark>", "</mark>");
/// assert_eq!(marked, "This wine is raw, <mark>chewy</mark>.");
/// ```
pub fn highlight<'a, I>(
    field_text: &str,
    query_terms: I,
    start_marker: &str,
    end_marker: &str,
) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut wanted: HashSet<String> = HashSet::new();
    for surface in query_terms {
        for term in tokenize(surface) {
            wanted.insert(term);
        }
    }
    if wanted.is_empty() {
        return field_text.to_string();
    }

    let spans: Vec<(usize, usize)> = tokenize_tokens(field_text)
        .into_iter()
        .filter(|token| wanted.contains(&token.term))
        .map(|token| (token.start, token.end))
        .collect();
    if spans.is_empty() {
        return field_text.to_string();
    }

    // Tokens arrive in text order; collapse any overlap so markers never
    // nest or duplicate.
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start < last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let mut out = String::with_capacity(
        field_text.len() + merged.len() * (start_marker.len() + end_marker.len()),
    );
    let mut cursor = 0;
    for (start, end) in merged {
        out.push_str(&field_text[cursor..start]);
        out.push_str(start_marker);
        out.push_str(&field_text[start..end]);
        out.push_str(end_marker);
        cursor = end;
    }
    out.push_str(&field_text[cursor..]);
    out
}
