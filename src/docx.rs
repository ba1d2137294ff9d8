//! OOXML `.docx` writer.
//!
//! Serializes a [`Document`] into `word/document.xml` and `word/styles.xml`
//! with `quick-xml` and packages them with the fixed relationship parts into
//! a zip archive.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::block::{Alignment, Block, Paragraph, ParagraphStyle, Table, TableRow, TextRun};
use crate::document::Document;
use crate::error::ExportError;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A4 portrait with one-inch margins, in twentieths of a point.
const PAGE_WIDTH: u32 = 11906;
const PAGE_HEIGHT: u32 = 16838;
const PAGE_MARGIN: u32 = 1440;
const TEXT_WIDTH: u32 = PAGE_WIDTH - 2 * PAGE_MARGIN;

/// Border width in eighths of a point.
const BORDER_SIZE: &str = "6";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Serialize a document to `.docx` bytes.
pub fn to_docx(document: &Document) -> Result<Vec<u8>, ExportError> {
    let body = document_xml(document)?;
    let styles = styles_xml()?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ("word/document.xml", body.as_slice()),
        ("word/styles.xml", styles.as_slice()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content)?;
    }
    let bytes = zip.finish()?.into_inner();

    debug!(
        blocks = document.blocks.len(),
        bytes = bytes.len(),
        "packaged docx"
    );
    Ok(bytes)
}

fn xml_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Xml(e.to_string())
}

/// Thin element writer over `quick_xml::Writer`.
struct Xml {
    writer: Writer<Vec<u8>>,
}

impl Xml {
    fn new() -> Result<Self, ExportError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    fn element<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        start
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::Start(Self::element(name, attrs)))
            .map_err(xml_error)
    }

    fn close(&mut self, name: &str) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::Empty(Self::element(name, attrs)))
            .map_err(xml_error)
    }

    fn text(&mut self, text: &str) -> Result<(), ExportError> {
        let text = xml_chars(text);
        self.writer
            .write_event(Event::Text(BytesText::new(&text)))
            .map_err(xml_error)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// Drops characters XML 1.0 cannot carry, such as most C0 controls.
fn xml_chars(text: &str) -> Cow<'_, str> {
    let allowed = |ch: char| {
        matches!(ch, '\t' | '\n' | '\r') || (ch >= ' ' && !matches!(ch, '\u{FFFE}' | '\u{FFFF}'))
    };
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&ch| allowed(ch)).collect())
    }
}

fn document_xml(document: &Document) -> Result<Vec<u8>, ExportError> {
    let mut xml = Xml::new()?;
    xml.open("w:document", &[("xmlns:w", W_NS), ("xmlns:r", R_NS)])?;
    xml.open("w:body", &[])?;

    for block in &document.blocks {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(&mut xml, paragraph)?,
            Block::Table(table) => write_table(&mut xml, table)?,
        }
    }
    // Word expects the body to end with a paragraph.
    if matches!(document.blocks.last(), Some(Block::Table(_))) {
        write_paragraph(&mut xml, &Paragraph::default())?;
    }

    write_section(&mut xml)?;
    xml.close("w:body")?;
    xml.close("w:document")?;
    Ok(xml.finish())
}

fn style_id(style: ParagraphStyle) -> Option<String> {
    match style {
        ParagraphStyle::Normal => None,
        ParagraphStyle::Title => Some("Title".to_string()),
        ParagraphStyle::Heading(level) => Some(format!("Heading{}", level.clamp(1, 6))),
    }
}

fn write_paragraph(xml: &mut Xml, paragraph: &Paragraph) -> Result<(), ExportError> {
    xml.open("w:p", &[])?;

    let style = style_id(paragraph.style);
    let has_props = style.is_some()
        || !paragraph.spacing.is_zero()
        || paragraph.alignment != Alignment::Left;
    if has_props {
        xml.open("w:pPr", &[])?;
        if let Some(style) = &style {
            xml.empty("w:pStyle", &[("w:val", style.as_str())])?;
        }
        if !paragraph.spacing.is_zero() {
            let before = paragraph.spacing.before.to_string();
            let after = paragraph.spacing.after.to_string();
            xml.empty("w:spacing", &[("w:before", before.as_str()), ("w:after", after.as_str())])?;
        }
        if paragraph.alignment == Alignment::Center {
            xml.empty("w:jc", &[("w:val", "center")])?;
        }
        xml.close("w:pPr")?;
    }

    for run in paragraph.runs.iter().filter(|run| !run.text.is_empty()) {
        write_run(xml, run)?;
    }

    xml.close("w:p")
}

fn write_run(xml: &mut Xml, run: &TextRun) -> Result<(), ExportError> {
    xml.open("w:r", &[])?;
    if run.bold || run.italic {
        xml.open("w:rPr", &[])?;
        if run.bold {
            xml.empty("w:b", &[])?;
        }
        if run.italic {
            xml.empty("w:i", &[])?;
        }
        xml.close("w:rPr")?;
    }
    xml.open("w:t", &[("xml:space", "preserve")])?;
    xml.text(&run.text)?;
    xml.close("w:t")?;
    xml.close("w:r")
}

fn write_borders(xml: &mut Xml, container: &str, edges: &[&str]) -> Result<(), ExportError> {
    xml.open(container, &[])?;
    for edge in edges {
        xml.empty(
            &format!("w:{edge}"),
            &[
                ("w:val", "single"),
                ("w:sz", BORDER_SIZE),
                ("w:space", "0"),
                ("w:color", "auto"),
            ],
        )?;
    }
    xml.close(container)
}

const TABLE_EDGES: [&str; 6] = ["top", "left", "bottom", "right", "insideH", "insideV"];

fn write_table(xml: &mut Xml, table: &Table) -> Result<(), ExportError> {
    let columns = table.column_count().max(1);
    let column_width = (TEXT_WIDTH / columns as u32).to_string();

    xml.open("w:tbl", &[])?;
    xml.open("w:tblPr", &[])?;
    xml.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
    xml.empty("w:tblW", &[("w:w", "5000"), ("w:type", "pct")])?;
    write_borders(xml, "w:tblBorders", &TABLE_EDGES)?;
    xml.empty("w:tblLayout", &[("w:type", "autofit")])?;
    xml.close("w:tblPr")?;

    xml.open("w:tblGrid", &[])?;
    for _ in 0..columns {
        xml.empty("w:gridCol", &[("w:w", column_width.as_str())])?;
    }
    xml.close("w:tblGrid")?;

    for row in &table.rows {
        write_row(xml, row, column_width.as_str())?;
    }

    xml.close("w:tbl")
}

fn write_row(xml: &mut Xml, row: &TableRow, column_width: &str) -> Result<(), ExportError> {
    xml.open("w:tr", &[])?;
    if row.header {
        xml.open("w:trPr", &[])?;
        xml.empty("w:tblHeader", &[])?;
        xml.close("w:trPr")?;
    }
    for cell in &row.cells {
        xml.open("w:tc", &[])?;
        xml.open("w:tcPr", &[])?;
        xml.empty("w:tcW", &[("w:w", column_width), ("w:type", "dxa")])?;
        write_borders(xml, "w:tcBorders", &TABLE_EDGES[..4])?;
        if row.header {
            xml.empty("w:vAlign", &[("w:val", "center")])?;
        }
        xml.close("w:tcPr")?;
        write_paragraph(xml, &cell.paragraph)?;
        xml.close("w:tc")?;
    }
    xml.close("w:tr")
}

fn write_section(xml: &mut Xml) -> Result<(), ExportError> {
    let width = PAGE_WIDTH.to_string();
    let height = PAGE_HEIGHT.to_string();
    let margin = PAGE_MARGIN.to_string();
    xml.open("w:sectPr", &[])?;
    xml.empty("w:pgSz", &[("w:w", width.as_str()), ("w:h", height.as_str())])?;
    xml.empty(
        "w:pgMar",
        &[
            ("w:top", margin.as_str()),
            ("w:right", margin.as_str()),
            ("w:bottom", margin.as_str()),
            ("w:left", margin.as_str()),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    xml.close("w:sectPr")
}

/// Font size in half-points for each heading level.
fn heading_size(level: u8) -> &'static str {
    match level {
        1 => "32",
        2 => "28",
        3 => "26",
        _ => "24",
    }
}

fn write_paragraph_style(
    xml: &mut Xml,
    id: &str,
    name: &str,
    outline: Option<u8>,
    size: &str,
) -> Result<(), ExportError> {
    xml.open("w:style", &[("w:type", "paragraph"), ("w:styleId", id)])?;
    xml.empty("w:name", &[("w:val", name)])?;
    xml.empty("w:basedOn", &[("w:val", "Normal")])?;
    xml.empty("w:next", &[("w:val", "Normal")])?;
    xml.empty("w:qFormat", &[])?;
    xml.open("w:pPr", &[])?;
    xml.empty("w:keepNext", &[])?;
    if let Some(level) = outline {
        let level = (level - 1).to_string();
        xml.empty("w:outlineLvl", &[("w:val", level.as_str())])?;
    }
    xml.close("w:pPr")?;
    xml.open("w:rPr", &[])?;
    xml.empty("w:b", &[])?;
    xml.empty("w:sz", &[("w:val", size)])?;
    xml.close("w:rPr")?;
    xml.close("w:style")
}

fn styles_xml() -> Result<Vec<u8>, ExportError> {
    let mut xml = Xml::new()?;
    xml.open("w:styles", &[("xmlns:w", W_NS)])?;

    xml.open("w:docDefaults", &[])?;
    xml.open("w:rPrDefault", &[])?;
    xml.open("w:rPr", &[])?;
    xml.empty(
        "w:rFonts",
        &[
            ("w:ascii", "Calibri"),
            ("w:hAnsi", "Calibri"),
            ("w:cs", "Calibri"),
        ],
    )?;
    xml.empty("w:sz", &[("w:val", "22")])?;
    xml.close("w:rPr")?;
    xml.close("w:rPrDefault")?;
    xml.close("w:docDefaults")?;

    xml.open(
        "w:style",
        &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
    )?;
    xml.empty("w:name", &[("w:val", "Normal")])?;
    xml.empty("w:qFormat", &[])?;
    xml.close("w:style")?;

    write_paragraph_style(&mut xml, "Title", "Title", None, "48")?;
    for level in 1..=6u8 {
        let id = format!("Heading{level}");
        let name = format!("heading {level}");
        write_paragraph_style(&mut xml, &id, &name, Some(level), heading_size(level))?;
    }

    xml.open("w:style", &[("w:type", "table"), ("w:styleId", "TableGrid")])?;
    xml.empty("w:name", &[("w:val", "Table Grid")])?;
    xml.open("w:tblPr", &[])?;
    write_borders(&mut xml, "w:tblBorders", &TABLE_EDGES)?;
    xml.close("w:tblPr")?;
    xml.close("w:style")?;

    xml.close("w:styles")?;
    Ok(xml.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Spacing, TableCell};
    use std::io::Read;
    use zip::ZipArchive;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    fn body(document: &Document) -> String {
        String::from_utf8(document_xml(document).unwrap()).unwrap()
    }

    #[test]
    fn package_contains_all_parts() {
        let bytes = to_docx(&Document::default()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/styles.xml",
            ]
        );
    }

    #[test]
    fn formatted_runs() {
        let doc = Document::new(vec![Block::Paragraph(Paragraph::new(vec![
            TextRun::plain("a "),
            TextRun::bold("b"),
            TextRun::italic("c"),
        ]))]);
        let xml = body(&doc);
        assert!(xml.contains(
            r#"<w:p><w:r><w:t xml:space="preserve">a </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">b</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">c</w:t></w:r></w:p>"#
        ));
    }

    #[test]
    fn paragraph_properties() {
        let doc = Document::new(vec![
            Paragraph::text("Judul")
                .with_style(ParagraphStyle::Title)
                .with_alignment(Alignment::Center)
                .into(),
            Paragraph::heading(2, vec![TextRun::plain("Bab")]).into(),
            Paragraph::spacer(Spacing::BLANK).into(),
        ]);
        let xml = body(&doc);
        assert!(xml.contains(
            r#"<w:pPr><w:pStyle w:val="Title"/><w:jc w:val="center"/></w:pPr>"#
        ));
        assert!(xml.contains(
            r#"<w:pPr><w:pStyle w:val="Heading2"/><w:spacing w:before="180" w:after="180"/></w:pPr>"#
        ));
        assert!(xml.contains(r#"<w:p><w:pPr><w:spacing w:before="0" w:after="120"/></w:pPr></w:p>"#));
    }

    #[test]
    fn text_is_escaped() {
        let doc = Document::new(vec![Paragraph::text("R&D <3").into()]);
        assert!(body(&doc).contains("R&amp;D &lt;3"));
    }

    #[test]
    fn control_characters_are_dropped() {
        let xml = body(&Document::from_markdown("a\u{0001}b\u{000C}c\td"));
        assert!(xml.contains(r#"<w:t xml:space="preserve">abc\td</w:t>"#));
        assert!(!xml.contains('\u{1}'));
        assert!(!xml.contains('\u{c}'));
    }

    #[test]
    fn header_row_repeats() {
        let cell = |text: &str| TableCell::new(Paragraph::text(text));
        let table = Table {
            rows: vec![
                TableRow {
                    cells: vec![cell("A"), cell("B")],
                    header: true,
                },
                TableRow {
                    cells: vec![cell("1"), cell("2")],
                    header: false,
                },
            ],
        };
        let xml = body(&Document::new(vec![table.into()]));
        assert_eq!(xml.matches("<w:tblHeader/>").count(), 1);
        assert_eq!(xml.matches("<w:gridCol ").count(), 2);
        assert_eq!(xml.matches("<w:tc>").count(), 4);
        assert!(xml.contains(r#"<w:tblW w:w="5000" w:type="pct"/>"#));
        assert!(xml.contains(r#"<w:vAlign w:val="center"/></w:tcPr><w:p><w:r><w:t xml:space="preserve">A</w:t></w:r></w:p>"#));
        assert!(xml.contains(r#"<w:r><w:t xml:space="preserve">1</w:t></w:r>"#));
        // trailing paragraph after a final table
        assert!(xml.contains("</w:tbl><w:p></w:p><w:sectPr>"));
    }

    #[test]
    fn styles_define_titles_and_headings() {
        let bytes = to_docx(&Document::default()).unwrap();
        let styles = part(&bytes, "word/styles.xml");
        assert!(styles.contains(r#"w:styleId="Title""#));
        for level in 1..=6 {
            assert!(styles.contains(&format!(r#"w:styleId="Heading{level}""#)));
        }
        assert!(styles.contains(r#"w:styleId="TableGrid""#));
        assert!(part(&bytes, "[Content_Types].xml").contains("/word/styles.xml"));
    }
}
