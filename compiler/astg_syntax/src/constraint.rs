//! Build constraints: `//go:build` lines, legacy `// +build` lines and
//! `_GOOS_GOARCH` file name suffixes.

use rustc_hash::FxHashSet;

use crate::ast::SourceFile;
use crate::error::{Result, SyntaxError};

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mipsle", "mips64", "mips64le", "ppc64",
    "ppc64le", "riscv64", "s390x", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Tags a build is evaluated against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTags {
    pub goos: String,
    pub goarch: String,
    /// Extra tags, e.g. from `-tags`.
    pub tags: FxHashSet<String>,
}

impl Default for BuildTags {
    fn default() -> Self {
        BuildTags::new("linux", "amd64")
    }
}

impl BuildTags {
    pub fn new(goos: &str, goarch: &str) -> Self {
        BuildTags {
            goos: goos.to_string(),
            goarch: goarch.to_string(),
            tags: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Whether a single tag is satisfied.
    pub fn has(&self, tag: &str) -> bool {
        tag == self.goos
            || tag == self.goarch
            || tag == "gc"
            || (tag == "unix" && UNIX_OS.contains(&self.goos.as_str()))
            || is_release_tag(tag)
            || self.tags.contains(tag)
    }
}

/// `go1.N` release tags are all considered satisfied.
fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// Parsed constraint expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    /// Parse a `//go:build` expression.
    pub fn parse(expr: &str) -> Result<Constraint> {
        let tokens = tokenize(expr)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let result = parser.or()?;
        if parser.pos != parser.tokens.len() {
            return Err(SyntaxError::BadConstraint(expr.to_string()));
        }
        Ok(result)
    }

    pub fn eval(&self, tags: &BuildTags) -> bool {
        match self {
            Constraint::Tag(tag) => tags.has(tag),
            Constraint::Not(inner) => !inner.eval(tags),
            Constraint::And(a, b) => a.eval(tags) && b.eval(tags),
            Constraint::Or(a, b) => a.eval(tags) || b.eval(tags),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    Tag(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Tok>> {
    let mut out = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '!' => {
                chars.next();
                out.push(Tok::Not);
            }
            '(' => {
                chars.next();
                out.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                out.push(Tok::RParen);
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return Err(SyntaxError::BadConstraint(expr.to_string()));
                }
                out.push(if c == '&' { Tok::And } else { Tok::Or });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        tag.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push(Tok::Tag(tag));
            }
            _ => return Err(SyntaxError::BadConstraint(expr.to_string())),
        }
    }
    Ok(out)
}

struct ExprParser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn bad(&self) -> SyntaxError {
        SyntaxError::BadConstraint(format!("{:?}", self.tokens))
    }

    fn or(&mut self) -> Result<Constraint> {
        let mut left = self.and()?;
        while self.peek() == Some(&Tok::Or) {
            self.pos += 1;
            left = Constraint::Or(Box::new(left), Box::new(self.and()?));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Constraint> {
        let mut left = self.not()?;
        while self.peek() == Some(&Tok::And) {
            self.pos += 1;
            left = Constraint::And(Box::new(left), Box::new(self.not()?));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Constraint> {
        match self.tokens.get(self.pos).cloned() {
            Some(Tok::Not) => {
                self.pos += 1;
                Ok(Constraint::Not(Box::new(self.not()?)))
            }
            Some(Tok::LParen) => {
                self.pos += 1;
                let inner = self.or()?;
                if self.peek() != Some(&Tok::RParen) {
                    return Err(self.bad());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(Tok::Tag(tag)) => {
                self.pos += 1;
                Ok(Constraint::Tag(tag))
            }
            _ => Err(self.bad()),
        }
    }
}

/// Extract the constraint expression from the comments above the package
/// clause. `//go:build` wins over legacy `// +build` lines, which are
/// rewritten into the same expression syntax.
pub fn from_header<'a>(comments: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut legacy = Vec::new();
    for text in comments {
        if let Some(expr) = text.strip_prefix("//go:build ") {
            return Some(expr.trim().to_string());
        }
        if let Some(line) = text.strip_prefix("// +build ") {
            legacy.push(legacy_line(line));
        }
    }
    if legacy.is_empty() {
        None
    } else if legacy.len() == 1 {
        legacy.pop()
    } else {
        Some(
            legacy
                .iter()
                .map(|l| format!("({l})"))
                .collect::<Vec<_>>()
                .join(" && "),
        )
    }
}

/// `a,b !c` means `(a && b) || !c`.
fn legacy_line(line: &str) -> String {
    let options: Vec<String> = line
        .split_whitespace()
        .map(|opt| {
            let terms: Vec<&str> = opt.split(',').filter(|t| !t.is_empty()).collect();
            if terms.len() > 1 {
                format!("({})", terms.join(" && "))
            } else {
                terms.join("")
            }
        })
        .collect();
    options.join(" || ")
}

/// Whether the `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` suffix of a file name
/// matches the target.
pub fn matches_file_name(name: &str, tags: &BuildTags) -> bool {
    let stem = name.strip_suffix(".go").unwrap_or(name);
    let stem = stem.strip_suffix("_test").unwrap_or(stem);
    let parts: Vec<&str> = stem.split('_').collect();
    // The first element is never a constraint (`linux.go` is unconstrained).
    let parts = parts.get(1..).unwrap_or_default();
    match parts {
        [.., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
            tags.has(os) && tags.has(arch)
        }
        [.., last] if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => tags.has(last),
        _ => true,
    }
}

/// Whether a parsed file takes part in a build for `tags`.
///
/// Unparseable constraints exclude the file, like the go tool does.
pub fn file_included(file: &SourceFile, tags: &BuildTags) -> bool {
    let name = file
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !matches_file_name(name, tags) {
        return false;
    }
    match &file.build_constraint {
        None => true,
        Some(expr) => Constraint::parse(expr).is_ok_and(|c| c.eval(tags)),
    }
}
