//! Line and token scanner for layout checks.
//!
//! Works on raw text, independently of the syntax tree. It knows enough
//! about Python tokens to tell code from strings and comments, and to join
//! bracketed or backslash-continued physical lines into logical lines.

/// A `#` comment on a physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Byte column of the `#`.
    pub column: usize,
    /// Comment text starting with `#`.
    pub text: String,
}

/// One physical source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalLine {
    /// Line number (1-based).
    pub number: usize,
    /// Line text without terminator.
    pub text: String,
    /// Comment found on this line outside any string.
    pub comment: Option<Comment>,
    /// The line starts inside a multi-line string.
    pub in_string: bool,
    /// The line continues a logical line started earlier.
    pub continuation: bool,
}

impl PhysicalLine {
    /// Blank outside strings and logical-line continuations.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        !self.in_string && !self.continuation && self.text.trim().is_empty()
    }

    /// Holds only a comment.
    #[must_use]
    pub fn is_comment_only(&self) -> bool {
        !self.in_string
            && !self.continuation
            && self
                .comment
                .as_ref()
                .is_some_and(|c| self.text[..c.column].trim().is_empty())
    }
}

/// A statement-level logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// Code with comments removed; continuation lines are joined by a space.
    pub text: String,
    /// First physical line.
    pub start_line: usize,
    /// Last physical line.
    pub end_line: usize,
    /// Indentation width of the first line, tabs expanded to multiples of 8.
    pub indent: usize,
    /// Blank lines before this line; comment lines split runs and the longest run counts.
    pub blank_before: usize,
}

/// Result of scanning one file.
#[derive(Debug, Clone, Default)]
pub struct LineScan {
    /// Physical lines in order.
    pub physical: Vec<PhysicalLine>,
    /// Logical lines in order.
    pub logical: Vec<LogicalLine>,
    /// Whether the source ends with a newline.
    pub ends_with_newline: bool,
}

#[derive(Debug, Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
}

/// Indentation width with tabs expanded to the next multiple of 8.
#[must_use]
pub fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            '\x0c' => width = 0,
            _ => break,
        }
    }
    width
}

/// Scans source text into physical and logical lines.
#[must_use]
pub fn scan(source: &str) -> LineScan {
    let mut scan = LineScan {
        ends_with_newline: source.ends_with('\n'),
        ..LineScan::default()
    };

    let mut string: Option<OpenString> = None;
    let mut depth = 0usize;

    let mut pending: Option<LogicalLine> = None;
    let mut run = 0usize;
    let mut longest_run = 0usize;

    for (idx, raw) in source.lines().enumerate() {
        let number = idx + 1;
        let in_string = string.is_some();
        let continuation = pending.is_some();
        let chars: Vec<(usize, char)> = raw.char_indices().collect();
        let mut comment = None;
        let mut code_end = raw.len();

        let mut i = 0;
        while i < chars.len() {
            let (pos, c) = chars[i];
            if let Some(open) = string {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == open.quote {
                    if !open.triple {
                        string = None;
                    } else if chars.get(i + 1).map(|&(_, n)| n) == Some(c)
                        && chars.get(i + 2).map(|&(_, n)| n) == Some(c)
                    {
                        string = None;
                        i += 3;
                        continue;
                    }
                }
                i += 1;
                continue;
            }
            match c {
                '#' => {
                    comment = Some(Comment {
                        column: pos,
                        text: raw[pos..].to_owned(),
                    });
                    code_end = pos;
                    break;
                }
                '"' | '\'' => {
                    let triple = chars.get(i + 1).map(|&(_, n)| n) == Some(c)
                        && chars.get(i + 2).map(|&(_, n)| n) == Some(c);
                    string = Some(OpenString { quote: c, triple });
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }

        // An unterminated single-quoted string ends with its line.
        if string.is_some_and(|open| !open.triple) && !raw.ends_with('\\') {
            string = None;
        }

        let code = &raw[..code_end];
        let line = PhysicalLine {
            number,
            text: raw.to_owned(),
            comment,
            in_string,
            continuation,
        };

        if line.is_blank() {
            run += 1;
            longest_run = longest_run.max(run);
        } else if line.is_comment_only() {
            run = 0;
        } else {
            let backslash = string.is_none() && code.trim_end().ends_with('\\');
            let mut segment = if continuation { code.trim() } else { code.trim_end() };
            if backslash {
                segment = segment.trim_end_matches('\\').trim_end();
            }
            match pending.as_mut() {
                Some(logical) => {
                    logical.text.push(' ');
                    logical.text.push_str(segment);
                    logical.end_line = number;
                }
                None => {
                    pending = Some(LogicalLine {
                        text: segment.trim_start().to_owned(),
                        start_line: number,
                        end_line: number,
                        indent: indent_width(raw),
                        blank_before: longest_run,
                    });
                    run = 0;
                    longest_run = 0;
                }
            }
            if string.is_none() && depth == 0 && !backslash {
                scan.logical.extend(pending.take());
            }
        }

        scan.physical.push(line);
    }

    if let Some(done) = pending {
        scan.logical.push(done);
    }
    scan
}
