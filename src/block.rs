/// A contiguous span of text with its formatting flags
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            italic: false,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: true,
        }
    }
}

/// Paragraph style. Heading levels are always within 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphStyle {
    #[default]
    Normal,
    Title,
    Heading(u8),
}

impl ParagraphStyle {
    /// Heading style for a `#` count, clamped to 1..=6.
    pub fn heading(level: usize) -> Self {
        ParagraphStyle::Heading(level.clamp(1, 6) as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// Vertical spacing hint in twentieths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spacing {
    pub before: u32,
    pub after: u32,
}

impl Spacing {
    pub const HEADING: Spacing = Spacing {
        before: 180,
        after: 180,
    };
    pub const BLANK: Spacing = Spacing {
        before: 0,
        after: 120,
    };
    pub const CELL: Spacing = Spacing {
        before: 0,
        after: 100,
    };
    pub const SECTION: Spacing = Spacing {
        before: 0,
        after: 240,
    };

    pub fn is_zero(&self) -> bool {
        self.before == 0 && self.after == 0
    }
}

/// A paragraph of text runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub style: ParagraphStyle,
    pub alignment: Alignment,
    pub spacing: Spacing,
}

impl Paragraph {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// A single unformatted run, used for identity lines and code lines.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self::new(vec![TextRun::plain(text)])
    }

    /// An empty paragraph that only carries spacing.
    pub fn spacer(spacing: Spacing) -> Self {
        Self {
            spacing,
            ..Self::default()
        }
    }

    pub fn heading(level: usize, runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            style: ParagraphStyle::heading(level),
            spacing: Spacing::HEADING,
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: ParagraphStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.style {
            ParagraphStyle::Heading(level) => Some(level),
            _ => None,
        }
    }

    /// True for spacing-only paragraphs.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|run| run.text.is_empty())
    }

    /// Concatenated run text with formatting dropped.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub paragraph: Paragraph,
}

impl TableCell {
    pub fn new(paragraph: Paragraph) -> Self {
        Self { paragraph }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub header: bool,
}

impl TableRow {
    pub fn cell_texts(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| cell.paragraph.plain_text())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Widest row; rows of a table with a header all share this width.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }

    pub fn header(&self) -> Option<&TableRow> {
        self.rows.first().filter(|row| row.header)
    }

    pub fn body(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|row| !row.header)
    }
}

/// Block-level elements of a word-processor document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl From<Paragraph> for Block {
    fn from(paragraph: Paragraph) -> Self {
        Block::Paragraph(paragraph)
    }
}

impl From<Table> for Block {
    fn from(table: Table) -> Self {
        Block::Table(table)
    }
}
