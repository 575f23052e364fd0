use crate::{
    core::version::Dialect,
    error::{VcfError, VcfResult},
};
use indexmap::IndexMap;
use std::{iter::Peekable, str::Chars};

pub const COMPOUND_TAGS: [&str; 4] = ["ID", "Number", "Type", "Description"];
pub const FILTER_TAGS: [&str; 2] = ["ID", "Description"];

const DESCRIPTION_TAG: &str = "Description";
const QUOTE: char = '"';
const ESCAPE: char = '\\';

impl Dialect {
    /// Split a structured header line value into its tagged fields.
    ///
    /// The resulting keys always equal `expected`, in order. In the v4 dialect the
    /// keys are read from the text and checked; in the v3 dialect they are assigned
    /// by position.
    pub fn parse(&self, value: &str, expected: &[&str]) -> VcfResult<IndexMap<String, String>> {
        match self {
            Dialect::V4 => parse_keyed(value, expected),
            Dialect::V3 => parse_positional(value, expected),
        }
    }

    /// Render tagged fields back into a header line value.
    pub fn format(&self, fields: &[(&str, &str)]) -> String {
        match self {
            Dialect::V4 => {
                let body = fields
                    .iter()
                    .map(|(key, value)| {
                        if *key == DESCRIPTION_TAG || needs_quotes(value) {
                            format!("{key}=\"{}\"", escape(value))
                        } else {
                            format!("{key}={value}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                format!("<{body}>")
            }
            Dialect::V3 => {
                let last = fields.len().saturating_sub(1);
                fields
                    .iter()
                    .enumerate()
                    .map(|(i, (_, value))| {
                        if i == last || value.contains(',') || value.contains(QUOTE) {
                            format!("\"{}\"", escape(value))
                        } else {
                            value.to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            }
        }
    }
}

fn needs_quotes(value: &str) -> bool {
    value.contains(',') || value.contains(' ') || value.contains(QUOTE)
}

/// Backslash-escape quotes and backslashes inside a quoted value.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == QUOTE || c == ESCAPE {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Inside quotes, `\"` and `\\` stand for the bare character; any other
/// backslash is kept as written.
fn unescape_next(chars: &mut Peekable<Chars<'_>>, current: &mut String) {
    match chars.peek() {
        Some(&next) if next == QUOTE || next == ESCAPE => {
            current.push(next);
            chars.next();
        }
        _ => current.push(ESCAPE),
    }
}

fn parse_keyed(value: &str, expected: &[&str]) -> VcfResult<IndexMap<String, String>> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(|| {
            VcfError::grammar(format!("expected a value enclosed in <...>, found {trimmed}"))
        })?;

    let mut fields = IndexMap::new();
    let mut key = String::new();
    let mut current = String::new();
    let mut in_key = true;
    let mut in_quotes = false;

    let mut flush = |key: &mut String, current: &mut String, in_key: bool| -> VcfResult<()> {
        if in_key {
            return Err(VcfError::grammar(format!(
                "tag {:?} has no value in {trimmed}",
                current.as_str()
            )));
        }
        let name = std::mem::take(key);
        if fields
            .insert(name.clone(), std::mem::take(current))
            .is_some()
        {
            return Err(VcfError::grammar(format!(
                "tag {name} appears twice in {trimmed}"
            )));
        }
        Ok(())
    };

    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE if in_quotes => unescape_next(&mut chars, &mut current),
            QUOTE => in_quotes = !in_quotes,
            '=' if !in_quotes && in_key => {
                key = std::mem::take(&mut current);
                in_key = false;
            }
            ',' if !in_quotes => {
                flush(&mut key, &mut current, in_key)?;
                in_key = true;
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(VcfError::grammar(format!("unterminated quote in {trimmed}")));
    }
    if !inner.is_empty() {
        flush(&mut key, &mut current, in_key)?;
    }

    let found: Vec<&str> = fields.keys().map(String::as_str).collect();
    if found != expected {
        return Err(VcfError::grammar(format!(
            "expected tags [{}], found [{}]",
            expected.join(","),
            found.join(",")
        )));
    }
    Ok(fields)
}

fn parse_positional(value: &str, expected: &[&str]) -> VcfResult<IndexMap<String, String>> {
    let mut values = Vec::with_capacity(expected.len());
    let mut current = String::new();
    let mut in_quotes = false;

    let mut chars = value.trim().chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE if in_quotes => unescape_next(&mut chars, &mut current),
            QUOTE => in_quotes = !in_quotes,
            ',' if !in_quotes => values.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(VcfError::grammar(format!("unterminated quote in {value}")));
    }
    values.push(current);

    if values.len() != expected.len() {
        return Err(VcfError::grammar(format!(
            "expected {} fields ({}), found {} in {value}",
            expected.len(),
            expected.join(","),
            values.len()
        )));
    }
    Ok(expected
        .iter()
        .map(|tag| tag.to_string())
        .zip(values)
        .collect())
}
