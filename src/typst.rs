use crate::block::{Alignment, Block, Paragraph, ParagraphStyle, Table, TextRun};

/// Tables up to this many rows are kept on one page.
const UNBREAKABLE_TABLE_ROWS: usize = 10;

/// Convert blocks to Typst markup
pub fn blocks_to_typst(blocks: &[Block]) -> String {
    let mut out = String::new();

    // Set up paragraph settings to prevent widows/orphans
    out.push_str("#set par(linebreaks: \"optimized\")\n\n");

    let mut i = 0;
    while i < blocks.len() {
        match &blocks[i] {
            Block::Paragraph(p) if p.heading_level().is_some() => {
                // Keep heading with the spacers and first content that follow it
                out.push_str("#block(breakable: false)[\n");
                emit_paragraph(p, &mut out);
                while let Some(next) = blocks.get(i + 1) {
                    i += 1;
                    emit_block(next, &mut out);
                    if !is_spacer(next) {
                        break;
                    }
                }
                out.push_str("]\n\n");
            }
            block => emit_block(block, &mut out),
        }
        i += 1;
    }

    out
}

fn is_spacer(block: &Block) -> bool {
    matches!(block, Block::Paragraph(p) if p.is_blank())
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        Block::Paragraph(p) => emit_paragraph(p, out),
        Block::Table(table) => {
            if table.rows.len() <= UNBREAKABLE_TABLE_ROWS {
                out.push_str("#block(breakable: false)[\n");
                table_to_typst(table, out);
                out.push_str("]\n\n");
            } else {
                table_to_typst(table, out);
                out.push('\n');
            }
        }
    }
}

/// Spacing hints are twentieths of a point.
fn points(twips: u32) -> f64 {
    f64::from(twips) / 20.0
}

fn emit_paragraph(p: &Paragraph, out: &mut String) {
    if p.is_blank() {
        if p.spacing.after > 0 {
            out.push_str(&format!("#v({}pt)\n\n", points(p.spacing.after)));
        }
        return;
    }

    match p.style {
        ParagraphStyle::Heading(level) => {
            for _ in 0..level {
                out.push('=');
            }
            out.push(' ');
            runs_to_typst(&p.runs, out);
        }
        ParagraphStyle::Title => {
            out.push_str("#align(center)[#text(size: 20pt, weight: \"bold\")[");
            runs_to_typst(&p.runs, out);
            out.push_str("]]");
        }
        ParagraphStyle::Normal if p.alignment == Alignment::Center => {
            out.push_str("#align(center)[");
            runs_to_typst(&p.runs, out);
            out.push(']');
        }
        ParagraphStyle::Normal => runs_to_typst(&p.runs, out),
    }
    out.push('\n');
    out.push('\n');
}

fn runs_to_typst(runs: &[TextRun], out: &mut String) {
    let mut after_call = false;
    for run in runs {
        // `(` or `.` right after `#strong[..]` would extend the call
        if after_call && run.text.starts_with(['(', '.']) {
            out.push(';');
        }
        after_call = run_to_typst(run, out);
    }
}

fn escape_into(text: &str, out: &mut String) {
    // Escape special Typst characters
    for ch in text.chars() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '/' | '='
            | '-' | '+' | '~' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
}

/// Formatted runs use `#strong` and `#emph`, which bind inside words.
/// Surrounding whitespace is kept outside the call. Returns true when the
/// output ends with a call.
fn run_to_typst(run: &TextRun, out: &mut String) -> bool {
    let text = run.text.as_str();
    if !(run.bold || run.italic) || text.trim().is_empty() {
        escape_into(text, out);
        return false;
    }

    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();
    escape_into(&text[..start], out);
    if run.bold {
        out.push_str("#strong[");
    }
    if run.italic {
        out.push_str("#emph[");
    }
    escape_into(&text[start..end], out);
    if run.italic {
        out.push(']');
    }
    if run.bold {
        out.push(']');
    }
    escape_into(&text[end..], out);
    end == text.len()
}

fn table_to_typst(table: &Table, out: &mut String) {
    let col_count = table.column_count();
    if col_count == 0 {
        return;
    }

    out.push_str("#table(\n");
    out.push_str(&format!("  columns: {},\n", col_count));

    for row in &table.rows {
        for cell in &row.cells {
            let runs = &cell.paragraph.runs;
            if row.header && !cell.paragraph.is_blank() {
                // Header cells are bold as a whole
                let plain: Vec<TextRun> = runs
                    .iter()
                    .map(|run| TextRun {
                        bold: false,
                        ..run.clone()
                    })
                    .collect();
                out.push_str("  [#strong[");
                runs_to_typst(&plain, out);
                out.push_str("]],\n");
            } else {
                out.push_str("  [");
                runs_to_typst(runs, out);
                out.push_str("],\n");
            }
        }
        // Pad short rows so later rows stay aligned
        for _ in row.cells.len()..col_count {
            out.push_str("  [],\n");
        }
    }

    out.push_str(")\n");
}

#[cfg(test)]
mod tests {
    use super::blocks_to_typst;
    use crate::block::{Alignment, Paragraph, ParagraphStyle};
    use crate::markdown_to_typst;

    const PREAMBLE: &str = "#set par(linebreaks: \"optimized\")\n\n";

    #[test]
    fn heading() {
        assert_eq!(
            markdown_to_typst("# Hello"),
            format!("{PREAMBLE}#block(breakable: false)[\n= Hello\n\n]\n\n")
        );
    }

    #[test]
    fn heading_keeps_spacer_and_following_content() {
        let result = markdown_to_typst("# Title\n\nSome text.\nMore.");
        assert_eq!(
            result,
            format!(
                "{PREAMBLE}#block(breakable: false)[\n= Title\n\n#v(6pt)\n\nSome text.\n\n]\n\nMore.\n\n"
            )
        );
    }

    #[test]
    fn clamped_heading_level() {
        assert!(markdown_to_typst("######## Deep").contains("====== Deep\n\n"));
    }

    #[test]
    fn paragraph() {
        assert_eq!(
            markdown_to_typst("Hello world"),
            format!("{PREAMBLE}Hello world\n\n")
        );
    }

    #[test]
    fn bold_and_italic() {
        assert_eq!(
            markdown_to_typst("**bold**"),
            format!("{PREAMBLE}#strong[bold]\n\n")
        );
        assert_eq!(
            markdown_to_typst("*italic*"),
            format!("{PREAMBLE}#emph[italic]\n\n")
        );
        assert_eq!(
            markdown_to_typst("a __b__ _c_"),
            format!("{PREAMBLE}a #strong[b] #emph[c]\n\n")
        );
    }

    #[test]
    fn emphasis_whitespace_moves_outside() {
        assert_eq!(
            markdown_to_typst("**bold *inner* bold**"),
            format!("{PREAMBLE}\\*#emph[bold] inner #emph[bold]\\*\n\n")
        );
    }

    #[test]
    fn emphasis_inside_a_word() {
        assert_eq!(
            markdown_to_typst("Siswa **aktif**nya tinggi."),
            format!("{PREAMBLE}Siswa #strong[aktif]nya tinggi.\n\n")
        );
        assert_eq!(
            markdown_to_typst("ber_main_ lagi"),
            format!("{PREAMBLE}ber#emph[main] lagi\n\n")
        );
    }

    #[test]
    fn call_is_terminated_before_parenthesis() {
        assert_eq!(
            markdown_to_typst("**Diskusi**(20 menit)"),
            format!("{PREAMBLE}#strong[Diskusi];(20 menit)\n\n")
        );
        assert_eq!(
            markdown_to_typst("**Diskusi** (20 menit)"),
            format!("{PREAMBLE}#strong[Diskusi] (20 menit)\n\n")
        );
    }

    #[test]
    fn code_block_lines_are_plain() {
        assert_eq!(
            markdown_to_typst("```\nlet x = 1;\n```"),
            format!("{PREAMBLE}#v(6pt)\n\nlet x \\= 1;\n\n#v(6pt)\n\n")
        );
    }

    #[test]
    fn escapes_special_chars() {
        assert_eq!(markdown_to_typst("a * b"), format!("{PREAMBLE}a \\* b\n\n"));
        assert_eq!(markdown_to_typst("a # b"), format!("{PREAMBLE}a \\# b\n\n"));
        assert_eq!(markdown_to_typst("a_b"), format!("{PREAMBLE}a\\_b\n\n"));
        assert_eq!(
            markdown_to_typst("2024/2025 - 1"),
            format!("{PREAMBLE}2024\\/2025 \\- 1\n\n")
        );
    }

    #[test]
    fn table() {
        let md = "| A | B |\n|---|---|\n| 1 | 2 |";
        let expected = format!(
            "{PREAMBLE}#block(breakable: false)[\n#table(\n  columns: 2,\n  [#strong[A]],\n  [#strong[B]],\n  [1],\n  [2],\n)\n]\n\n"
        );
        assert_eq!(markdown_to_typst(md), expected);
    }

    #[test]
    fn table_interior_empty_cell() {
        let md = "| A | B | C |\n|---|---|---|\n| 1 |  | 3 |";
        assert!(markdown_to_typst(md).contains("  [1],\n  [],\n  [3],\n"));
    }

    #[test]
    fn title_and_centered_lines() {
        let blocks = vec![
            Paragraph::text("Judul")
                .with_style(ParagraphStyle::Title)
                .with_alignment(Alignment::Center)
                .into(),
            Paragraph::text("Oleh: Siti")
                .with_alignment(Alignment::Center)
                .into(),
        ];
        assert_eq!(
            blocks_to_typst(&blocks),
            format!(
                "{PREAMBLE}#align(center)[#text(size: 20pt, weight: \"bold\")[Judul]]\n\n#align(center)[Oleh: Siti]\n\n"
            )
        );
    }
}
