//! Assembly of exportable documents from lesson data and converted Markdown.

use tracing::debug;

use crate::block::{
    Alignment, Block, Paragraph, ParagraphStyle, Spacing, Table, TableCell, TableRow, TextRun,
};
use crate::curriculum::{
    LearningSequence, LessonForm, OBJECTIVE_COLUMNS, ObjectivesAnalysis, SEQUENCE_COLUMNS,
    join_dimensions,
};
use crate::parser;

const RECAP_TITLE: &str = "Aplikasi Tujuan & Perencanaan Pembelajaran Mendalam";

/// An ordered list of blocks ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// A document holding only the converted Markdown.
    pub fn from_markdown(markdown: &str) -> Self {
        Self::new(parser::parse(markdown))
    }

    fn push(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    fn title(&mut self, text: &str) {
        self.push(
            Paragraph::text(text)
                .with_style(ParagraphStyle::Title)
                .with_alignment(Alignment::Center),
        );
    }

    fn centered(&mut self, text: String) {
        self.push(Paragraph::text(text).with_alignment(Alignment::Center));
    }

    fn section(&mut self, text: String) {
        self.push(Paragraph::text(text).with_style(ParagraphStyle::Heading(1)));
    }

    /// Recap of the whole session: identity, objectives analysis and
    /// learning sequence. Sections without data are left out.
    pub fn recap(
        form: Option<&LessonForm>,
        objectives: Option<&ObjectivesAnalysis>,
        sequence: Option<&LearningSequence>,
        default_teacher: &str,
    ) -> Self {
        let mut doc = Self::default();
        doc.title(RECAP_TITLE);
        doc.centered(format!("Oleh: {}", teacher_name(form, default_teacher)));
        doc.push(Paragraph::spacer(Spacing::SECTION));

        if let Some(form) = form {
            doc.section("I. IDENTITAS UMUM".to_string());
            for line in [
                format!("Nama Madrasah: {}", form.institution),
                format!("Nama Guru: {}", form.teacher),
                format!("Mata Pelajaran: {}", form.subject),
                format!("Fase: {}", form.phase),
                format!("Kelas: {}", form.grade),
                format!("Tahun Pelajaran: {}", form.academic_year),
                format!("Semester: {}", form.semester),
            ] {
                doc.push(Paragraph::text(line));
            }
            doc.push(Paragraph::spacer(Spacing::SECTION));
        }

        if let Some(analysis) = objectives.filter(|a| !a.is_empty()) {
            doc.section(format!(
                "II. Hasil Analisis Tujuan Pembelajaran ({} Semester)",
                analysis.semester
            ));
            doc.push(Paragraph::spacer(Spacing::BLANK));
            let rows = analysis.flatten().into_iter().map(|row| {
                vec![
                    row.no.to_string(),
                    row.learning_outcome,
                    row.content,
                    row.competency,
                    row.subject_matter,
                    row.objective,
                ]
            });
            doc.push(data_table(&OBJECTIVE_COLUMNS, rows));
            doc.push(Paragraph::spacer(Spacing::SECTION));
        }

        if let Some(sequence) = sequence.filter(|s| !s.is_empty()) {
            doc.section("III. Alur Tujuan Pembelajaran (ATP)".to_string());
            doc.push(Paragraph::spacer(Spacing::BLANK));
            let rows = sequence.items.iter().map(|item| {
                vec![
                    item.no.to_string(),
                    item.objective.clone(),
                    item.indicator.clone(),
                    item.subject_matter.clone(),
                    item.kbc_values.clone(),
                    item.time_allocation.clone(),
                    join_dimensions(&item.profile_dimensions, ", "),
                    item.assessment.clone(),
                    item.learning_resources.clone(),
                ]
            });
            doc.push(data_table(&SEQUENCE_COLUMNS, rows));
            doc.push(Paragraph::spacer(Spacing::SECTION));
        }

        debug!(blocks = doc.blocks.len(), "assembled recap document");
        doc
    }

    /// A single lesson plan: title block followed by the converted plan.
    pub fn lesson_plan(
        markdown: &str,
        objective_no: u32,
        form: Option<&LessonForm>,
        default_teacher: &str,
    ) -> Self {
        let subject = form
            .map(|f| f.subject.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Pelajaran");

        let mut doc = Self::default();
        doc.title(&format!(
            "Perencanaan Pembelajaran Mendalam TP ke-{}",
            objective_no
        ));
        doc.centered(format!("Mata Pelajaran: {}", subject));
        doc.centered(format!("Oleh: {}", teacher_name(form, default_teacher)));
        doc.push(Paragraph::spacer(Spacing::SECTION));
        doc.blocks.extend(parser::parse(markdown));

        debug!(blocks = doc.blocks.len(), objective_no, "assembled lesson plan document");
        doc
    }

    /// Document title: the first Title paragraph, else the first heading.
    pub fn title_text(&self) -> Option<String> {
        let paragraphs = || {
            self.blocks.iter().filter_map(|block| match block {
                Block::Paragraph(p) => Some(p),
                Block::Table(_) => None,
            })
        };
        paragraphs()
            .find(|p| p.style == ParagraphStyle::Title)
            .or_else(|| paragraphs().find(|p| p.heading_level().is_some()))
            .map(Paragraph::plain_text)
    }
}

fn teacher_name<'a>(form: Option<&'a LessonForm>, default_teacher: &'a str) -> &'a str {
    form.map(|f| f.teacher.as_str())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(default_teacher)
}

/// Table with a bold header row over plain data rows.
fn data_table(columns: &[&str], rows: impl Iterator<Item = Vec<String>>) -> Table {
    let header = TableRow {
        cells: columns
            .iter()
            .map(|name| TableCell::new(Paragraph::new(vec![TextRun::bold(*name)])))
            .collect(),
        header: true,
    };
    let body = rows.map(|cells| TableRow {
        cells: cells
            .into_iter()
            .map(|text| TableCell::new(Paragraph::text(text)))
            .collect(),
        header: false,
    });
    Table {
        rows: std::iter::once(header).chain(body).collect(),
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_filename_part(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn form_part<'a>(
    form: Option<&'a LessonForm>,
    field: impl Fn(&'a LessonForm) -> &'a str,
    fallback: &'a str,
) -> String {
    let value = form
        .map(field)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(fallback);
    sanitize_filename_part(value)
}

pub fn recap_filename(form: Option<&LessonForm>) -> String {
    format!(
        "Kurikulum_Mendalam_Rekap_{}_{}.docx",
        form_part(form, |f| f.subject.as_str(), "Generated"),
        form_part(form, |f| f.academic_year.as_str(), "Tahun"),
    )
}

pub fn lesson_plan_filename(objective_no: u32, form: Option<&LessonForm>) -> String {
    format!(
        "PPM_TP_{}_{}_{}.docx",
        objective_no,
        form_part(form, |f| f.subject.as_str(), "Pelajaran"),
        form_part(form, |f| f.academic_year.as_str(), "Tahun"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{
        Grade, ObjectiveDetail, OutcomeAnalysis, Phase, ProfileDimension, Semester, SequenceItem,
    };

    fn form() -> LessonForm {
        LessonForm {
            institution: "MTs Al Falah".into(),
            teacher: "Pak Budi".into(),
            subject: "Ilmu Pengetahuan Alam".into(),
            phase: Phase::D,
            grade: Grade::G8,
            academic_year: "2024/2025".into(),
            semester: Semester::Even,
            learning_outcomes: vec!["Ekosistem".into()],
        }
    }

    fn analysis() -> ObjectivesAnalysis {
        ObjectivesAnalysis {
            semester: Semester::Even,
            analyses: vec![OutcomeAnalysis {
                learning_outcome: "Ekosistem".into(),
                details: vec![ObjectiveDetail {
                    no: 1,
                    content: "Rantai makanan".into(),
                    competency: "Menganalisis".into(),
                    subject_matter: "Ekosistem".into(),
                    objective: "Menganalisis rantai makanan".into(),
                }],
            }],
        }
    }

    fn sequence() -> LearningSequence {
        LearningSequence {
            items: vec![SequenceItem {
                no: 1,
                objective: "Menganalisis rantai makanan".into(),
                indicator: "Menyusun rantai makanan".into(),
                subject_matter: "Ekosistem".into(),
                kbc_values: "Cinta Alam".into(),
                time_allocation: "80 Menit (2 JP)".into(),
                profile_dimensions: vec![
                    ProfileDimension::CriticalReasoning,
                    ProfileDimension::Collaboration,
                ],
                assessment: "Observasi".into(),
                learning_resources: "Buku siswa".into(),
            }],
        }
    }

    fn paragraph(block: &Block) -> &Paragraph {
        match block {
            Block::Paragraph(p) => p,
            Block::Table(_) => panic!("expected paragraph, got table"),
        }
    }

    fn tables(doc: &Document) -> Vec<&Table> {
        doc.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                Block::Paragraph(_) => None,
            })
            .collect()
    }

    #[test]
    fn recap_without_data_has_only_title_block() {
        let doc = Document::recap(None, None, None, "HARMAJI");
        assert_eq!(doc.blocks.len(), 3);
        let title = paragraph(&doc.blocks[0]);
        assert_eq!(title.style, ParagraphStyle::Title);
        assert_eq!(title.alignment, Alignment::Center);
        assert_eq!(paragraph(&doc.blocks[1]).plain_text(), "Oleh: HARMAJI");
        assert_eq!(paragraph(&doc.blocks[2]).spacing, Spacing::SECTION);
    }

    #[test]
    fn recap_lists_identity_fields() {
        let f = form();
        let doc = Document::recap(Some(&f), None, None, "HARMAJI");
        let texts: Vec<String> = doc
            .blocks
            .iter()
            .map(|b| paragraph(b).plain_text())
            .collect();
        assert_eq!(texts[1], "Oleh: Pak Budi");
        assert_eq!(texts[3], "I. IDENTITAS UMUM");
        assert_eq!(texts[4], "Nama Madrasah: MTs Al Falah");
        assert_eq!(texts[8], "Kelas: 8");
        assert_eq!(texts[10], "Semester: Genap");
        assert_eq!(doc.blocks.len(), 12);
    }

    #[test]
    fn recap_tables_have_bold_headers() {
        let f = form();
        let doc = Document::recap(Some(&f), Some(&analysis()), Some(&sequence()), "HARMAJI");
        let tables = tables(&doc);
        assert_eq!(tables.len(), 2);

        let objectives = tables[0];
        assert_eq!(objectives.column_count(), 6);
        let header = objectives.header().unwrap();
        assert!(header.cells.iter().all(|c| c.paragraph.runs[0].bold));
        assert_eq!(header.cell_texts()[5], "Tujuan Pembelajaran");
        assert_eq!(objectives.rows[1].cell_texts()[0], "1");

        let seq = tables[1];
        assert_eq!(seq.column_count(), 9);
        assert_eq!(
            seq.rows[1].cell_texts()[6],
            "Penalaran Kritis, Kolaborasi"
        );
        assert_eq!(
            doc.title_text().as_deref(),
            Some("Aplikasi Tujuan & Perencanaan Pembelajaran Mendalam")
        );
    }

    #[test]
    fn recap_skips_empty_results() {
        let empty = ObjectivesAnalysis {
            semester: Semester::Odd,
            analyses: Vec::new(),
        };
        let doc = Document::recap(None, Some(&empty), Some(&LearningSequence { items: vec![] }), "X");
        assert!(tables(&doc).is_empty());
    }

    #[test]
    fn lesson_plan_prefixes_title_block() {
        let f = form();
        let doc = Document::lesson_plan("# Rencana\n\nIsi", 4, Some(&f), "HARMAJI");
        assert_eq!(
            paragraph(&doc.blocks[0]).plain_text(),
            "Perencanaan Pembelajaran Mendalam TP ke-4"
        );
        assert_eq!(
            paragraph(&doc.blocks[1]).plain_text(),
            "Mata Pelajaran: Ilmu Pengetahuan Alam"
        );
        assert_eq!(paragraph(&doc.blocks[4]).heading_level(), Some(1));
        assert_eq!(doc.blocks.len(), 7);
    }

    #[test]
    fn lesson_plan_without_form_uses_fallbacks() {
        let doc = Document::lesson_plan("", 1, None, "HARMAJI");
        assert_eq!(
            paragraph(&doc.blocks[1]).plain_text(),
            "Mata Pelajaran: Pelajaran"
        );
        assert_eq!(paragraph(&doc.blocks[2]).plain_text(), "Oleh: HARMAJI");
        assert_eq!(doc.blocks.len(), 4);
    }

    #[test]
    fn filenames_are_sanitized() {
        let f = form();
        assert_eq!(
            recap_filename(Some(&f)),
            "Kurikulum_Mendalam_Rekap_Ilmu_Pengetahuan_Alam_2024_2025.docx"
        );
        assert_eq!(
            lesson_plan_filename(3, Some(&f)),
            "PPM_TP_3_Ilmu_Pengetahuan_Alam_2024_2025.docx"
        );
        assert_eq!(recap_filename(None), "Kurikulum_Mendalam_Rekap_Generated_Tahun.docx");
        assert_eq!(lesson_plan_filename(2, None), "PPM_TP_2_Pelajaran_Tahun.docx");
    }

    #[test]
    fn title_falls_back_to_heading() {
        let doc = Document::from_markdown("intro\n## Bab Satu\n");
        assert_eq!(doc.title_text().as_deref(), Some("Bab Satu"));
        assert_eq!(Document::default().title_text(), None);
    }
}
