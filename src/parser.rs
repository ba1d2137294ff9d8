use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::block::{Block, Paragraph, Spacing, Table, TableCell, TableRow};
use crate::inline::parse_inline_formatting;

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#+)\s(.+)").expect("heading pattern is valid"));

// Pipe-bounded dash runs, tolerating GFM padding and alignment colons.
static SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|(?:\s*:?-+:?\s*\|)*\s*:?-+:?\s*\|?$").expect("separator pattern is valid")
});

/// Classification of one physical line
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind<'a> {
    Fence,
    Code(&'a str),
    TableRow(&'a str),
    Heading { level: usize, text: &'a str },
    Blank,
    Text(&'a str),
}

fn classify(line: &str, in_code_block: bool) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.starts_with("```") {
        return LineKind::Fence;
    }
    if in_code_block {
        return LineKind::Code(line);
    }
    if is_table_line(line) {
        return LineKind::TableRow(line);
    }
    if let Some(caps) = HEADING.captures(line) {
        if let (Some(hashes), Some(text)) = (caps.get(1), caps.get(2)) {
            return LineKind::Heading {
                level: hashes.as_str().len(),
                text: text.as_str(),
            };
        }
    }
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    LineKind::Text(line)
}

/// A table line starts with `|` and holds at least one more `|`.
fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed[1..].contains('|')
}

fn is_separator(line: &str) -> bool {
    SEPARATOR.is_match(line.trim())
}

/// Split a table line on `|`, dropping the empty fragments outside the
/// leading and trailing pipes. Interior empty cells are kept.
fn split_cells(line: &str) -> Vec<String> {
    let mut cells: Vec<&str> = line.trim().split('|').map(str::trim).collect();
    if cells.first().is_some_and(|cell| cell.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|cell| cell.is_empty()) {
        cells.pop();
    }
    cells.into_iter().map(String::from).collect()
}

/// Per-call conversion state
#[derive(Default)]
struct ParseState {
    in_code_block: bool,
    table_lines: Vec<String>,
    blocks: Vec<Block>,
}

impl ParseState {
    fn process_line(mut self, line: &str, next: Option<&str>) -> Self {
        match classify(line, self.in_code_block) {
            LineKind::Fence => {
                self.flush_table();
                self.push(Paragraph::spacer(Spacing::BLANK));
                self.in_code_block = !self.in_code_block;
            }
            LineKind::Code(raw) => {
                self.push(Paragraph::text(raw));
            }
            LineKind::TableRow(raw) => {
                self.table_lines.push(raw.to_string());
                // Tables have no terminator; they end where table lines stop.
                if !next.is_some_and(is_table_line) {
                    self.flush_table();
                }
            }
            kind => {
                self.flush_table();
                match kind {
                    LineKind::Heading { level, text } => {
                        self.push(Paragraph::heading(level, parse_inline_formatting(text)));
                    }
                    LineKind::Blank => {
                        self.push(Paragraph::spacer(Spacing::BLANK));
                    }
                    LineKind::Text(text) => {
                        let runs = parse_inline_formatting(text);
                        if !runs.is_empty() {
                            self.push(Paragraph::new(runs));
                        }
                    }
                    LineKind::Fence | LineKind::Code(_) | LineKind::TableRow(_) => {}
                }
            }
        }
        self
    }

    fn push(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    fn flush_table(&mut self) {
        if self.table_lines.is_empty() {
            return;
        }
        let lines = std::mem::take(&mut self.table_lines);
        if let Some(table) = build_table(&lines) {
            self.blocks.push(Block::Table(table));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_table();
        self.blocks
    }
}

fn build_table(lines: &[String]) -> Option<Table> {
    let lines: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|line| line.trim().starts_with('|'))
        .collect();
    if lines.is_empty() {
        return None;
    }

    let (header, body) = match lines.iter().position(|line| is_separator(line)) {
        Some(sep) => {
            let header = if sep > 0 {
                split_cells(lines[sep - 1])
            } else {
                Vec::new()
            };
            (header, &lines[sep + 1..])
        }
        None => {
            let mut header = split_cells(lines[0]);
            if header.iter().all(String::is_empty) {
                header.clear();
            }
            (header, &lines[1..])
        }
    };

    let mut rows = Vec::with_capacity(body.len() + 1);
    if !header.is_empty() {
        rows.push(table_row(&header, true));
    }

    let mut dropped = 0;
    for line in body {
        let cells = split_cells(line);
        if !cells.is_empty() && (header.is_empty() || cells.len() == header.len()) {
            rows.push(table_row(&cells, false));
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        debug!(dropped, width = header.len(), "Dropped table rows with mismatched width");
    }

    if rows.is_empty() {
        None
    } else {
        Some(Table { rows })
    }
}

fn table_row(cells: &[String], header: bool) -> TableRow {
    TableRow {
        cells: cells
            .iter()
            .map(|text| {
                TableCell::new(
                    Paragraph::new(parse_inline_formatting(text)).with_spacing(Spacing::CELL),
                )
            })
            .collect(),
        header,
    }
}

/// Convert a Markdown subset into document blocks.
///
/// Recognizes code fences, pipe tables, `#` headings, blank lines and
/// paragraphs with bold/italic emphasis. Never fails: anything else
/// degrades to a plain paragraph.
pub fn parse(markdown: &str) -> Vec<Block> {
    if markdown.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = markdown
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let blocks = lines
        .iter()
        .enumerate()
        .fold(ParseState::default(), |state, (i, line)| {
            state.process_line(line, lines.get(i + 1).copied())
        })
        .finish();

    debug!(lines = lines.len(), blocks = blocks.len(), "Converted markdown");
    blocks
}
