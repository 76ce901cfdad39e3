//! Single-scope annotation map and comment parsing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tags of one scope (a contract, a method, a variable or the project).
///
/// Backed by a `BTreeMap` so serialized projects are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, String>);

/// Result of splitting a comment block into prose and tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedComments {
    /// Lines without a leading `@`, trimmed, with blank edges removed.
    pub docs: Vec<String>,
    /// Tags found on `@` lines.
    pub annotations: Annotations,
}

/// Split comment lines (already stripped of `//`) into docs and tags.
///
/// A line is a tag when its first non-blank character is `@`. The tag name
/// runs to the first whitespace; the rest of the line, trimmed, is the value.
/// A later occurrence of the same tag overrides an earlier one.
pub fn parse_comments<S: AsRef<str>>(lines: &[S]) -> ParsedComments {
    let mut docs = Vec::new();
    let mut annotations = Annotations::new();

    for line in lines {
        let line = line.as_ref().trim();
        if let Some(body) = line.strip_prefix('@') {
            let (tag, value) = match body.find(char::is_whitespace) {
                Some(at) => (&body[..at], body[at..].trim()),
                None => (body, ""),
            };
            if !tag.is_empty() {
                annotations.insert(tag, value);
                continue;
            }
        }
        docs.push(line.to_string());
    }

    while docs.first().is_some_and(String::is_empty) {
        docs.remove(0);
    }
    while docs.last().is_some_and(String::is_empty) {
        docs.pop();
    }

    ParsedComments { docs, annotations }
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comment block, discarding the prose lines.
    pub fn from_comments<S: AsRef<str>>(lines: &[S]) -> Self {
        parse_comments(lines).annotations
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.0.insert(tag.into(), value.into());
    }

    pub fn remove(&mut self, tag: &str) -> Option<String> {
        self.0.remove(tag)
    }

    /// Whether the tag is present, even with an empty value.
    pub fn is_set(&self, tag: &str) -> bool {
        self.0.contains_key(tag)
    }

    /// Raw value of the tag. Present-but-empty tags yield `Some("")`.
    pub fn value(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    /// Non-empty value of the tag, or `default`.
    pub fn value_or<'a>(&'a self, tag: &str, default: &'a str) -> &'a str {
        match self.value(tag) {
            Some(v) if !v.is_empty() => v,
            _ => default,
        }
    }

    /// Integer value of the tag; missing or malformed values yield `default`.
    pub fn value_int(&self, tag: &str, default: i64) -> i64 {
        self.value(tag)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Boolean value of the tag.
    ///
    /// A present tag without a value reads as `true`; missing or malformed
    /// values yield `default`.
    pub fn value_bool(&self, tag: &str, default: bool) -> bool {
        match self.value(tag) {
            Some(v) => parse_bool(v).unwrap_or(default),
            None => default,
        }
    }

    /// `a|b` pairs of a comma-separated tag value.
    ///
    /// An entry without `|` maps a name onto itself. Empty entries are
    /// skipped.
    pub fn pairs(&self, tag: &str) -> Vec<(String, String)> {
        self.value(tag).map(parse_pairs).unwrap_or_default()
    }

    /// Overlay `other` on top of `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Annotations) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Tags named after an HTTP error status (400–599), in ascending order.
    pub fn error_codes(&self) -> impl Iterator<Item = (u16, &str)> {
        self.iter()
            .filter_map(|(k, v)| crate::names::error_code(k).map(|code| (code, v)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Annotations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Annotations::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_pairs(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.split_once('|') {
            Some((from, to)) => {
                let (from, to) = (from.trim(), to.trim());
                (!from.is_empty() && !to.is_empty()).then(|| (from.to_string(), to.to_string()))
            }
            None => Some((entry.to_string(), entry.to_string())),
        })
        .collect()
}
