//! Line-anchored regex extraction for languages without a bundled parser.
//!
//! Each extractor runs one pattern per declaration form over the whole file
//! and then uses [`SourceText`] to recover what a regex cannot see: line
//! numbers, block extents and which container a member belongs to. None of
//! this validates syntax; malformed input just yields fewer symbols.

#[cfg(feature = "lang-java")]
pub mod java;
#[cfg(feature = "lang-python")]
pub mod python;
#[cfg(feature = "lang-rust")]
pub mod rust_lang;
#[cfg(feature = "lang-typescript")]
pub mod typescript;

use super::Symbol;

/// Lexical conventions needed to count braces outside strings and comments.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Syntax {
    pub quotes: &'static [char],
    pub line_comment: &'static str,
}

impl Syntax {
    pub const C_LIKE: Syntax = Syntax {
        quotes: &['"', '\''],
        line_comment: "//",
    };
    pub const SCRIPT: Syntax = Syntax {
        quotes: &['"', '\'', '`'],
        line_comment: "//",
    };
    /// Rust: `'` also introduces lifetimes, so only `"` opens a string.
    pub const RUST: Syntax = Syntax {
        quotes: &['"'],
        line_comment: "//",
    };
    pub const PYTHON: Syntax = Syntax {
        quotes: &['"', '\''],
        line_comment: "#",
    };

    /// Visit the structural characters of a line, skipping string literals
    /// and anything after a line comment. Strings never span lines here.
    fn scan(self, line: &str, mut visit: impl FnMut(char)) {
        let mut in_string: Option<char> = None;
        let mut escaped = false;
        for (idx, ch) in line.char_indices() {
            if let Some(quote) = in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    in_string = None;
                }
                continue;
            }
            if line[idx..].starts_with(self.line_comment) {
                return;
            }
            if self.quotes.contains(&ch) {
                in_string = Some(ch);
                continue;
            }
            visit(ch);
        }
    }
}

/// A source file split into lines with precomputed brace depths.
pub(crate) struct SourceText<'a> {
    lines: Vec<&'a str>,
    line_starts: Vec<usize>,
    /// Brace depth at the start of each line.
    depth_before: Vec<usize>,
    syntax: Syntax,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str, syntax: Syntax) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut line_starts = Vec::with_capacity(lines.len());
        let mut depth_before = Vec::with_capacity(lines.len());
        let mut offset = 0;
        let mut depth = 0usize;
        for line in &lines {
            line_starts.push(offset);
            depth_before.push(depth);
            offset += line.len() + 1;
            syntax.scan(line, |ch| match ch {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            });
        }
        Self {
            lines,
            line_starts,
            depth_before,
            syntax,
        }
    }

    /// 1-based line number of a byte offset.
    pub fn line_at(&self, offset: usize) -> u32 {
        self.line_starts.partition_point(|&start| start <= offset) as u32
    }

    /// Text of a 1-based line, without the trailing `\r`.
    pub fn line(&self, line: u32) -> &'a str {
        self.lines
            .get(line.saturating_sub(1) as usize)
            .map_or("", |l| l.trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Brace depth at the start of a 1-based line.
    pub fn depth_at(&self, line: u32) -> usize {
        self.depth_before
            .get(line.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Line holding the brace that closes the block opened at or after
    /// `start`. A `;` outside parentheses before any `{` ends the
    /// declaration on that line. Falls back to `start`.
    pub fn block_end(&self, start: u32) -> u32 {
        let mut depth = 0usize;
        let mut parens = 0usize;
        let mut opened = false;
        for line in start..=self.line_count() {
            let mut end = None;
            self.syntax.scan(self.line(line), |ch| {
                if end.is_some() {
                    return;
                }
                match ch {
                    '(' | '[' => parens += 1,
                    ')' | ']' => parens = parens.saturating_sub(1),
                    ';' if !opened && parens == 0 => end = Some(line),
                    '{' => {
                        depth += 1;
                        opened = true;
                    }
                    '}' if opened => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            end = Some(line);
                        }
                    }
                    _ => {}
                }
            });
            if let Some(end) = end {
                return end;
            }
        }
        start
    }

    /// Last line of an indentation block whose header is on `start`.
    /// Blank and comment-only lines never end a block.
    pub fn indent_block_end(&self, start: u32) -> u32 {
        let base = indent_width(self.line(start));
        let mut end = start;
        let mut parens = paren_balance(self.line(start));
        for line in start + 1..=self.line_count() {
            let text = self.line(line);
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with(self.syntax.line_comment) {
                continue;
            }
            // Continuation lines of a multi-line header.
            if parens > 0 {
                parens += paren_balance(text);
                end = line;
                continue;
            }
            if indent_width(text) <= base {
                break;
            }
            end = line;
        }
        end
    }

    /// Indentation of the first code line after `header`, if it is deeper
    /// than the header itself.
    pub fn body_indent(&self, header: u32, end: u32) -> Option<usize> {
        let base = indent_width(self.line(header));
        (header + 1..=end)
            .map(|line| self.line(line))
            .find(|text| {
                let trimmed = text.trim();
                !trimmed.is_empty() && !trimmed.starts_with(self.syntax.line_comment)
            })
            .map(indent_width)
            .filter(|&indent| indent > base)
    }
}

fn paren_balance(text: &str) -> i32 {
    text.chars().fold(0, |acc, ch| match ch {
        '(' | '[' => acc + 1,
        ')' | ']' => acc - 1,
        _ => acc,
    })
}

/// Leading whitespace width; a tab counts as one column.
pub(crate) fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-collapsed declaration header without its trailing body opener.
pub(crate) fn header_signature(matched: &str) -> String {
    let collapsed = collapse_whitespace(matched);
    collapsed
        .trim_end_matches(|c: char| matches!(c, '{' | ';' | ':') || c.is_whitespace())
        .to_owned()
}

/// Split a parameter list at commas that are not nested inside brackets.
pub(crate) fn split_params(raw: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    let mut prev = '\0';
    for ch in raw.chars() {
        match ch {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            // `=>` and `->` are arrows, not closing angle brackets.
            '>' if prev != '=' && prev != '-' => depth -= 1,
            ',' if depth <= 0 => {
                push_param(&mut params, &current);
                current.clear();
                prev = ch;
                continue;
            }
            _ => {}
        }
        current.push(ch);
        prev = ch;
    }
    push_param(&mut params, &current);
    params
}

fn push_param(params: &mut Vec<String>, raw: &str) {
    let param = collapse_whitespace(raw);
    if !param.is_empty() {
        params.push(param);
    }
}

/// Innermost scope whose body contains `line`.
pub(crate) fn enclosing(scopes: &[Symbol], line: u32) -> Option<&Symbol> {
    scopes
        .iter()
        .filter(|scope| scope.start_line < line && line <= scope.end_line)
        .max_by_key(|scope| scope.start_line)
}

/// Order symbols by position, keeping discovery order for ties.
pub(crate) fn sort_by_position(symbols: &mut [Symbol]) {
    symbols.sort_by_key(|sym| sym.start_line);
}
