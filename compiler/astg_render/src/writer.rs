//! Buffered Go source assembly.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Header line marking every generated Go file.
pub const GENERATED_HEADER: &str = "// Code generated by astg. DO NOT EDIT.";

/// Line-oriented writer with tab indentation.
#[derive(Debug, Default)]
pub struct CodeWriter {
    output: String,
    indent: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.indent > 0, "dedent called with zero indent");
        self.indent = self.indent.saturating_sub(1);
    }

    /// Write one line at the current indentation. Empty lines carry no
    /// indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.output.push('\t');
            }
            self.output.push_str(text);
        }
        self.output.push('\n');
    }

    /// Write a line that opens a block, then indent.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent();
    }

    /// Dedent, then write the line closing the block.
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.dedent();
        self.line(text);
    }

    /// A blank line, collapsing runs of them.
    pub fn blank(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with("\n\n") {
            self.output.push('\n');
        }
    }

    /// Doc comment lines, each prefixed with `// `.
    pub fn comment<S: AsRef<str>>(&mut self, lines: &[S]) {
        for line in lines {
            let line = line.as_ref();
            if line.is_empty() {
                self.line("//");
            } else {
                self.line(format!("// {line}"));
            }
        }
    }

    /// Append pre-formatted text, re-indenting each line.
    pub fn raw(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

/// Import set of one Go file: path to the name it is referenced by.
#[derive(Debug, Default)]
pub struct Imports {
    by_path: BTreeMap<String, ImportName>,
}

#[derive(Debug)]
struct ImportName {
    name: String,
    explicit: bool,
}

impl Imports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import `path` under its base name and return the name to use.
    pub fn add(&mut self, path: &str) -> String {
        self.add_named(path, default_name(path))
    }

    /// Import `path`, preferring `name`; a clash with another import gets
    /// a numeric suffix.
    pub fn add_named(&mut self, path: &str, name: &str) -> String {
        if let Some(existing) = self.by_path.get(path) {
            return existing.name.clone();
        }
        let mut candidate = name.to_string();
        let mut n = 1;
        while self.by_path.values().any(|i| i.name == candidate) {
            n += 1;
            candidate = format!("{name}{n}");
        }
        let explicit = candidate != default_name(path);
        self.by_path.insert(
            path.to_string(),
            ImportName {
                name: candidate.clone(),
                explicit,
            },
        );
        candidate
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// The import block: standard library first, then the rest.
    fn render(&self, out: &mut String) {
        if self.by_path.is_empty() {
            return;
        }
        let (std, other): (Vec<_>, Vec<_>) = self.by_path.iter().partition(|(path, _)| is_std(path));
        out.push_str("import (\n");
        for (i, group) in [std, other].iter().filter(|g| !g.is_empty()).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for (path, import) in group {
                if import.explicit {
                    let _ = writeln!(out, "\t{} \"{path}\"", import.name);
                } else {
                    let _ = writeln!(out, "\t\"{path}\"");
                }
            }
        }
        out.push_str(")\n\n");
    }
}

/// Name a package is referenced by when imported without an alias.
fn default_name(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    // `gopkg.in/yaml.v3` and `.../v5` major-version suffixes.
    if let Some((name, version)) = base.split_once(".v") {
        if version.chars().all(|c| c.is_ascii_digit()) {
            return name;
        }
    }
    if base.len() > 1 && base.starts_with('v') && base[1..].chars().all(|c| c.is_ascii_digit()) {
        let parent = path.rsplit('/').nth(1).unwrap_or(base);
        return parent;
    }
    base
}

/// Go interpreted string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_std(path: &str) -> bool {
    !path.split('/').next().unwrap_or(path).contains('.')
}

/// One generated Go source file.
#[derive(Debug)]
pub struct GoFile {
    pub package: String,
    pub imports: Imports,
    pub body: CodeWriter,
}

impl GoFile {
    pub fn new(package: impl Into<String>) -> Self {
        GoFile {
            package: package.into(),
            imports: Imports::new(),
            body: CodeWriter::new(),
        }
    }

    /// Header, package clause, imports and body.
    pub fn finish(mut self) -> String {
        let mut out = String::with_capacity(self.body.as_str().len() + 256);
        let _ = writeln!(out, "{GENERATED_HEADER}\n\npackage {}\n", self.package);
        self.imports.render(&mut out);
        out.push_str(self.body.take_output().trim_end());
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blocks_indent_with_tabs() {
        let mut w = CodeWriter::new();
        w.open("func f() {");
        w.open("if ok {");
        w.line("return");
        w.close("}");
        w.blank();
        w.close("}");
        assert_eq!(w.take_output(), "func f() {\n\tif ok {\n\t\treturn\n\t}\n\n}\n");
    }

    #[test]
    fn blank_lines_collapse() {
        let mut w = CodeWriter::new();
        w.blank();
        w.line("a");
        w.blank();
        w.blank();
        w.line("b");
        assert_eq!(w.as_str(), "a\n\nb\n");
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("/users/%s"), "\"/users/%s\"");
        assert_eq!(quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    }

    #[test]
    fn imports_group_and_alias() {
        let mut imports = Imports::new();
        assert_eq!(imports.add("net/http"), "http");
        assert_eq!(imports.add("github.com/vmihailenco/msgpack/v5"), "msgpack");
        assert_eq!(imports.add("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(imports.add_named("github.com/goccy/go-json", "json"), "json");
        assert_eq!(imports.add("encoding/json"), "json2");
        assert_eq!(imports.add("net/http"), "http");

        let mut file = GoFile::new("client");
        file.imports = imports;
        file.body.line("var _ = 1");
        assert_eq!(
            file.finish(),
            concat!(
                "// Code generated by astg. DO NOT EDIT.\n\n",
                "package client\n\n",
                "import (\n",
                "\tjson2 \"encoding/json\"\n",
                "\t\"net/http\"\n",
                "\n",
                "\tjson \"github.com/goccy/go-json\"\n",
                "\t\"github.com/vmihailenco/msgpack/v5\"\n",
                "\t\"gopkg.in/yaml.v3\"\n",
                ")\n\n",
                "var _ = 1\n",
            )
        );
    }
}
