//! Buffered Markdown document builder.
//!
//! Blocks are appended in order; the table of contents is a placeholder
//! filled from every recorded heading when the document is finished, so
//! it may be requested before the headings it lists.

use std::fmt::Write as _;

use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DocError {
    #[error("table row {row} has {found} cells, header has {expected}")]
    ColumnMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("table of contents already generated")]
    AlreadyGenerated,

    #[error("heading depth {min}..={max} out of range 1..=6")]
    OutOfRange { min: usize, max: usize },
}

#[derive(Debug)]
struct Heading {
    level: usize,
    text: String,
    anchor: String,
}

#[derive(Debug)]
enum Block {
    Text(String),
    Contents { min: usize, max: usize },
}

#[derive(Debug, Default)]
pub struct Markdown {
    blocks: Vec<Block>,
    headings: Vec<Heading>,
    anchors: FxHashMap<String, usize>,
    has_contents: bool,
}

impl Markdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a heading and return its anchor.
    pub fn heading(&mut self, level: usize, text: &str) -> Result<String, DocError> {
        if !(1..=6).contains(&level) {
            return Err(DocError::OutOfRange {
                min: level,
                max: level,
            });
        }
        Ok(self.fixed_heading(level, text))
    }

    pub fn h1(&mut self, text: &str) -> String {
        self.fixed_heading(1, text)
    }

    pub fn h2(&mut self, text: &str) -> String {
        self.fixed_heading(2, text)
    }

    pub fn h3(&mut self, text: &str) -> String {
        self.fixed_heading(3, text)
    }

    pub fn h4(&mut self, text: &str) -> String {
        self.fixed_heading(4, text)
    }

    pub fn h5(&mut self, text: &str) -> String {
        self.fixed_heading(5, text)
    }

    pub fn h6(&mut self, text: &str) -> String {
        self.fixed_heading(6, text)
    }

    fn fixed_heading(&mut self, level: usize, text: &str) -> String {
        let anchor = self.unique_anchor(text);
        self.push(format!("{} {text}", "#".repeat(level)));
        self.headings.push(Heading {
            level,
            text: text.to_string(),
            anchor: anchor.clone(),
        });
        anchor
    }

    pub fn paragraph(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.push(text.trim_end().to_string());
        }
    }

    /// A pipe table. Every row must have as many cells as `header`.
    pub fn table<S: AsRef<str>>(&mut self, header: &[&str], rows: &[Vec<S>]) -> Result<(), DocError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(DocError::ColumnMismatch {
                    row: i,
                    expected: header.len(),
                    found: row.len(),
                });
            }
        }
        let mut out = String::new();
        let _ = writeln!(out, "| {} |", header.iter().map(|h| escape_cell(h)).collect::<Vec<_>>().join(" | "));
        let _ = write!(out, "|{}", " --- |".repeat(header.len()));
        for row in rows {
            let cells: Vec<String> = row.iter().map(|c| escape_cell(c.as_ref())).collect();
            let _ = write!(out, "\n| {} |", cells.join(" | "));
        }
        self.push(out);
        Ok(())
    }

    pub fn code_block(&mut self, lang: &str, text: &str) {
        let fence = if text.contains("```") { "````" } else { "```" };
        self.push(format!("{fence}{lang}\n{}\n{fence}", text.trim_end_matches('\n')));
    }

    pub fn bullet_list<S: AsRef<str>>(&mut self, items: &[S]) {
        if items.is_empty() {
            return;
        }
        let list: Vec<String> = items.iter().map(|i| format!("- {}", i.as_ref())).collect();
        self.push(list.join("\n"));
    }

    pub fn blockquote(&mut self, text: &str) {
        let quoted: Vec<String> = text
            .lines()
            .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {l}") })
            .collect();
        self.push(quoted.join("\n"));
    }

    pub fn horizontal_rule(&mut self) {
        self.push("---".to_string());
    }

    /// Reserve the table of contents for headings of depth `min..=max`.
    pub fn table_of_contents(&mut self, min: usize, max: usize) -> Result<(), DocError> {
        if min == 0 || max > 6 || min > max {
            return Err(DocError::OutOfRange { min, max });
        }
        if self.has_contents {
            return Err(DocError::AlreadyGenerated);
        }
        self.has_contents = true;
        self.blocks.push(Block::Contents { min, max });
        Ok(())
    }

    /// A collapsible `<details>` section.
    pub fn details(&mut self, summary: &str, body: &str) {
        self.push(format!(
            "<details>\n<summary>{summary}</summary>\n\n{}\n\n</details>",
            body.trim_end()
        ));
    }

    /// Render the document, filling in the table of contents.
    pub fn finish(self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            if !out.is_empty() {
                out.push('\n');
            }
            match block {
                Block::Text(text) => out.push_str(text),
                Block::Contents { min, max } => {
                    for h in self.headings.iter().filter(|h| (*min..=*max).contains(&h.level)) {
                        let _ = writeln!(
                            out,
                            "{}- [{}](#{})",
                            "  ".repeat(h.level - min),
                            h.text,
                            h.anchor
                        );
                    }
                }
            }
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    fn push(&mut self, text: String) {
        self.blocks.push(Block::Text(text));
    }

    fn unique_anchor(&mut self, text: &str) -> String {
        let base = anchor(text);
        let seen = self.anchors.entry(base.clone()).or_insert(0);
        let out = if *seen == 0 { base } else { format!("{base}-{seen}") };
        *seen += 1;
        out
    }
}

/// GitHub heading anchor: lowercase, punctuation dropped, spaces to `-`.
pub fn anchor(text: &str) -> String {
    text.trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '-' | '_' => Some(c),
            c if c.is_alphanumeric() => Some(c),
            _ => None,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Inline link to a heading anchor.
pub fn link(text: &str, anchor: &str) -> String {
    format!("[{text}](#{anchor})")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}
