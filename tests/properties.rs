use lessonplan::{Block, parse, parse_inline_formatting};
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn table_line(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// A piece of a line: its Markdown source, the text it should leave behind,
/// and its (bold, italic) formatting.
fn segment() -> impl Strategy<Value = (String, String, bool, bool)> {
    let word = || "[a-z]{1,6}";
    prop_oneof![
        "[A-Za-z0-9 ,.]{1,8}".prop_map(|t| (t.clone(), t, false, false)),
        word().prop_map(|w| (format!("**{w}**"), w, true, false)),
        word().prop_map(|w| (format!("*{w}*"), w, false, true)),
        word().prop_map(|w| (format!("__{w}__"), w, true, false)),
        word().prop_map(|w| (format!("_{w}_"), w, false, true)),
    ]
}

proptest! {
    #[test]
    fn conversion_is_total(input in "\\PC*") {
        for block in parse(&input) {
            match block {
                Block::Paragraph(p) => {
                    if let Some(level) = p.heading_level() {
                        prop_assert!((1..=6).contains(&level));
                    }
                }
                Block::Table(table) => prop_assert!(!table.rows.is_empty()),
            }
        }
    }

    #[test]
    fn emphasis_delimiters_are_removed_and_text_kept(
        segments in prop::collection::vec(segment(), 1..10)
    ) {
        let markdown: String = segments.iter().map(|(md, ..)| md.as_str()).collect();
        let expected: String = segments.iter().map(|(_, text, ..)| text.as_str()).collect();
        let expected_formatted: Vec<(String, bool, bool)> = segments
            .iter()
            .filter(|(_, _, bold, italic)| *bold || *italic)
            .map(|(_, text, bold, italic)| (text.clone(), *bold, *italic))
            .collect();

        let runs = parse_inline_formatting(&markdown);
        let joined: String = runs.iter().map(|run| run.text.as_str()).collect();
        prop_assert_eq!(joined, expected);

        let formatted: Vec<(String, bool, bool)> = runs
            .iter()
            .filter(|run| run.bold || run.italic)
            .map(|run| (run.text.clone(), run.bold, run.italic))
            .collect();
        prop_assert_eq!(formatted, expected_formatted);
    }

    #[test]
    fn markup_free_lines_survive_verbatim(
        lines in prop::collection::vec("[A-Za-z0-9][A-Za-z0-9 ,.]{0,40}", 1..12)
    ) {
        let blocks = parse(&lines.join("\n"));
        let texts: Vec<String> = blocks
            .iter()
            .map(|block| match block {
                Block::Paragraph(p) => p.plain_text(),
                Block::Table(_) => String::from("<table>"),
            })
            .collect();
        prop_assert_eq!(texts, lines);
    }

    #[test]
    fn body_rows_match_header_width(
        header in prop::collection::vec(cell(), 1..5),
        rows in prop::collection::vec(prop::collection::vec(cell(), 1..6), 0..8)
    ) {
        let mut markdown = vec![
            table_line(&header),
            format!("|{}", "---|".repeat(header.len())),
        ];
        markdown.extend(rows.iter().map(|row| table_line(row)));

        let blocks = parse(&markdown.join("\n"));
        prop_assert_eq!(blocks.len(), 1);
        let Block::Table(table) = &blocks[0] else {
            panic!("expected a table");
        };

        prop_assert!(table.rows[0].header);
        prop_assert_eq!(table.rows[0].cell_texts(), header.clone());
        for row in &table.rows {
            prop_assert_eq!(row.cells.len(), header.len());
        }
        let kept = rows.iter().filter(|row| row.len() == header.len()).count();
        prop_assert_eq!(table.body().count(), kept);
    }
}
