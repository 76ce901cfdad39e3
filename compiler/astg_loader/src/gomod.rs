//! `go.mod` manifest parsing.

use std::path::{Path, PathBuf};

use crate::error::ResolveError;

/// A `require` entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

/// Right-hand side of a `replace` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// `=> ../local/dir`
    Local(PathBuf),
    /// `=> example.com/fork v1.2.3`
    Module { path: String, version: String },
}

/// A `replace` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replace {
    pub old_path: String,
    /// Only this version is replaced when set.
    pub old_version: Option<String>,
    pub target: ReplaceTarget,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: String,
    pub go_version: Option<String>,
    pub requires: Vec<Require>,
    pub replaces: Vec<Replace>,
}

impl GoMod {
    /// Read `<dir>/go.mod`.
    pub fn read(dir: &Path) -> Result<GoMod, ResolveError> {
        let path = dir.join("go.mod");
        let text = std::fs::read_to_string(&path).map_err(|e| ResolveError::io(path, e))?;
        GoMod::parse(&text)
    }

    pub fn parse(text: &str) -> Result<GoMod, ResolveError> {
        let mut gomod = GoMod::default();
        let mut block: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let (content, comment) = match raw.find("//") {
                Some(at) => (&raw[..at], raw[at + 2..].trim()),
                None => (raw, ""),
            };
            let content = content.trim();
            if content.is_empty() {
                continue;
            }

            if let Some(verb) = &block {
                if content == ")" {
                    block = None;
                    continue;
                }
                let verb = verb.clone();
                gomod.directive(&verb, content, comment, line_no)?;
                continue;
            }

            let (verb, rest) = content
                .split_once(char::is_whitespace)
                .map_or((content, ""), |(v, r)| (v, r.trim()));
            if rest == "(" {
                block = Some(verb.to_string());
                continue;
            }
            gomod.directive(verb, rest, comment, line_no)?;
        }

        if gomod.module.is_empty() {
            return Err(ResolveError::GoMod {
                line: 0,
                message: "missing module directive".to_string(),
            });
        }
        Ok(gomod)
    }

    fn directive(
        &mut self,
        verb: &str,
        args: &str,
        comment: &str,
        line: usize,
    ) -> Result<(), ResolveError> {
        let bad = |message: &str| ResolveError::GoMod {
            line,
            message: message.to_string(),
        };
        match verb {
            "module" => self.module = unquote(args).to_string(),
            "go" => self.go_version = Some(args.to_string()),
            "require" => {
                let mut parts = args.split_whitespace();
                let (Some(path), Some(version)) = (parts.next(), parts.next()) else {
                    return Err(bad("require needs a path and a version"));
                };
                self.requires.push(Require {
                    path: unquote(path).to_string(),
                    version: version.to_string(),
                    indirect: comment.split([';', ' ']).any(|w| w == "indirect"),
                });
            }
            "replace" => {
                let Some((old, new)) = args.split_once("=>") else {
                    return Err(bad("replace needs =>"));
                };
                let mut old = old.split_whitespace();
                let Some(old_path) = old.next() else {
                    return Err(bad("replace needs a module path"));
                };
                let new: Vec<&str> = new.split_whitespace().collect();
                let target = match new.as_slice() {
                    [path] => ReplaceTarget::Local(PathBuf::from(unquote(path))),
                    [path, version] => ReplaceTarget::Module {
                        path: unquote(path).to_string(),
                        version: (*version).to_string(),
                    },
                    _ => return Err(bad("malformed replacement")),
                };
                self.replaces.push(Replace {
                    old_path: unquote(old_path).to_string(),
                    old_version: old.next().map(str::to_string),
                    target,
                });
            }
            // exclude, retract, toolchain, godebug do not affect resolution.
            _ => {}
        }
        Ok(())
    }

    /// Version required for a module path, if any.
    pub fn required_version(&self, module_path: &str) -> Option<&str> {
        self.requires
            .iter()
            .find(|r| r.path == module_path)
            .map(|r| r.version.as_str())
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_directives() {
        let gomod = GoMod::parse(
            r#"module example.com/app // main module

go 1.22

require github.com/google/uuid v1.6.0

require (
	github.com/shopspring/decimal v1.4.0
	golang.org/x/text v0.14.0 // indirect
)

replace example.com/lib => ../lib

replace (
	github.com/old/mod v1.0.0 => github.com/new/mod v1.1.0
)

exclude github.com/bad/mod v0.1.0
"#,
        );
        let Ok(gomod) = gomod else {
            panic!("parse failed: {gomod:?}");
        };
        assert_eq!(gomod.module, "example.com/app");
        assert_eq!(gomod.go_version.as_deref(), Some("1.22"));
        assert_eq!(gomod.requires.len(), 3);
        assert!(!gomod.requires[1].indirect);
        assert!(gomod.requires[2].indirect);
        assert_eq!(gomod.required_version("github.com/google/uuid"), Some("v1.6.0"));
        assert_eq!(
            gomod.replaces[0].target,
            ReplaceTarget::Local(PathBuf::from("../lib"))
        );
        assert_eq!(gomod.replaces[1].old_version.as_deref(), Some("v1.0.0"));
        assert_eq!(
            gomod.replaces[1].target,
            ReplaceTarget::Module {
                path: "github.com/new/mod".into(),
                version: "v1.1.0".into()
            }
        );
    }

    #[test]
    fn requires_module_directive() {
        assert!(matches!(
            GoMod::parse("go 1.21\n"),
            Err(ResolveError::GoMod { .. })
        ));
        assert!(matches!(
            GoMod::parse("module x\nrequire broken\n"),
            Err(ResolveError::GoMod { line: 2, .. })
        ));
    }
}
