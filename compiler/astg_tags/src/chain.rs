//! Scoped tag evaluation across nested annotation maps.

use smallvec::SmallVec;

use crate::annotations::{parse_bool, parse_pairs};
use crate::Annotations;

/// Ordered view over annotation scopes, narrowest first.
///
/// Built from the broadest scope inward:
///
/// ```text
/// TagChain::root(&project.annotations)
///     .narrow(&contract.annotations)
///     .narrow(&method.annotations)
///     .narrow(&arg.annotations)
/// ```
#[derive(Clone, Debug, Default)]
pub struct TagChain<'a> {
    scopes: SmallVec<[&'a Annotations; 4]>,
}

impl<'a> TagChain<'a> {
    /// Start a chain with its broadest scope.
    pub fn root(scope: &'a Annotations) -> Self {
        let mut scopes = SmallVec::new();
        scopes.push(scope);
        TagChain { scopes }
    }

    /// Add a scope narrower than every scope already in the chain.
    #[must_use]
    pub fn narrow(mut self, scope: &'a Annotations) -> Self {
        self.scopes.insert(0, scope);
        self
    }

    /// [`narrow`](Self::narrow) when a scope exists.
    #[must_use]
    pub fn narrow_opt(self, scope: Option<&'a Annotations>) -> Self {
        match scope {
            Some(scope) => self.narrow(scope),
            None => self,
        }
    }

    /// True at the first scope where the tag is present.
    pub fn is_set(&self, tag: &str) -> bool {
        self.scopes.iter().any(|s| s.is_set(tag))
    }

    /// First non-empty value, searching narrowest to broadest.
    pub fn value(&self, tag: &str) -> Option<&'a str> {
        self.scopes
            .iter()
            .find_map(|s| s.value(tag).filter(|v| !v.is_empty()))
    }

    pub fn value_or(&self, tag: &str, default: &'a str) -> &'a str {
        self.value(tag).unwrap_or(default)
    }

    pub fn value_int(&self, tag: &str, default: i64) -> i64 {
        self.value(tag)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Boolean value; a tag present without a value anywhere reads as `true`.
    pub fn value_bool(&self, tag: &str, default: bool) -> bool {
        if let Some(v) = self.value(tag) {
            return parse_bool(v).unwrap_or(default);
        }
        if self.is_set(tag) {
            return true;
        }
        default
    }

    pub fn pairs(&self, tag: &str) -> Vec<(String, String)> {
        self.value(tag).map(parse_pairs).unwrap_or_default()
    }

    /// Number of scopes in the chain.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
