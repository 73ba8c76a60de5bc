//! `${...}` placeholder resolution.
//!
//! Supports `${key}`, `${key:default}` and placeholders nested inside keys
//! (`${db.${env}.url}`). Unresolvable placeholders without a default are left
//! in place; self-referencing chains are rejected.

use crate::error::{Error, Result};
use std::collections::HashSet;

const PREFIX: &str = "${";
const SUFFIX: &str = "}";
const VALUE_SEPARATOR: char = ':';

/// Resolve every placeholder in `text` using `lookup`.
pub fn resolve<F>(text: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut visiting = HashSet::new();
    parse(text, &lookup, &mut visiting)
}

fn parse<F>(value: &str, lookup: &F, visiting: &mut HashSet<String>) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = value.to_string();
    let mut start = result.find(PREFIX);

    while let Some(begin) = start {
        let Some(end) = find_placeholder_end(&result, begin) else {
            break;
        };
        let original = result[begin + PREFIX.len()..end].to_string();
        if !visiting.insert(original.clone()) {
            return Err(Error::CircularPlaceholder(original));
        }

        // Keys may themselves contain placeholders.
        let placeholder = parse(&original, lookup, visiting)?;
        let mut resolved = lookup(&placeholder);
        if resolved.is_none() {
            if let Some((key, default)) = placeholder.split_once(VALUE_SEPARATOR) {
                resolved = Some(lookup(key).unwrap_or_else(|| default.to_string()));
            }
        }

        start = match resolved {
            Some(raw) => {
                let value = parse(&raw, lookup, visiting)?;
                result.replace_range(begin..end + SUFFIX.len(), &value);
                let resume = begin + value.len();
                result[resume..].find(PREFIX).map(|i| i + resume)
            }
            None => {
                let resume = end + SUFFIX.len();
                result[resume..].find(PREFIX).map(|i| i + resume)
            }
        };
        visiting.remove(&original);
    }

    Ok(result)
}

/// Find the index of the `}` closing the placeholder opened at `begin`.
fn find_placeholder_end(text: &str, begin: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut index = begin + PREFIX.len();
    let mut nesting = 0usize;
    while index < bytes.len() {
        if text[index..].starts_with(SUFFIX) {
            if nesting == 0 {
                return Some(index);
            }
            nesting -= 1;
            index += SUFFIX.len();
        } else if text[index..].starts_with(PREFIX) {
            nesting += 1;
            index += PREFIX.len();
        } else {
            index += text[index..].chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}
