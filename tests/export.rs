use std::io::{Cursor, Read};

use lessonplan::{
    Document, Grade, LearningSequence, LessonForm, ObjectivesAnalysis, Phase, Semester,
    document_to_typst, markdown_to_docx, recap_filename, to_docx,
};
use zip::ZipArchive;

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let mut content = String::new();
    archive
        .by_name(name)
        .expect("part present")
        .read_to_string(&mut content)
        .expect("utf-8 part");
    content
}

fn form() -> LessonForm {
    LessonForm {
        institution: "MA Negeri 1".into(),
        teacher: "Bu Aisyah".into(),
        subject: "Fiqih".into(),
        phase: Phase::E,
        grade: Grade::G10,
        academic_year: "2024/2025".into(),
        semester: Semester::Odd,
        learning_outcomes: vec!["Memahami ketentuan thaharah".into()],
    }
}

const ANALYSIS: &str = r#"{
    "semester": "Ganjil",
    "analyses": [{
        "learningOutcome": "Memahami ketentuan thaharah",
        "details": [
            {"no": 1, "content": "Najis", "competency": "Mengidentifikasi",
             "subjectMatter": "Thaharah", "objective": "Mengidentifikasi macam najis"},
            {"no": 2, "content": "Wudhu", "competency": "Mempraktikkan",
             "subjectMatter": "Thaharah", "objective": "Mempraktikkan wudhu & tayamum"}
        ]
    }]
}"#;

const SEQUENCE: &str = r#"{
    "items": [{
        "no": 1, "objective": "Mengidentifikasi macam najis", "indicator": "Menyebutkan najis",
        "subjectMatter": "Thaharah", "kbcValues": "Cinta Allah dan Rasul-Nya",
        "timeAllocation": "90 Menit (2 JP)",
        "profileDimensions": ["Keimanan dan Ketakwaan terhadap Tuhan YME", "Kemandirian"],
        "assessment": "Tes lisan", "learningResources": "Buku Fiqih"
    }]
}"#;

#[test]
fn lesson_plan_markdown_exports_to_docx() {
    let markdown = "# Perencanaan Pembelajaran Mendalam\n\n**I. IDENTITAS**\nNama Guru: *Bu Aisyah*\n\n| No. | Kegiatan |\n|-----|----------|\n| 1 | Diskusi |\n\n```\ncatatan\n```\n";
    let document = Document::lesson_plan(markdown, 2, Some(&form()), "HARMAJI");
    let bytes = to_docx(&document).unwrap();
    let xml = read_part(&bytes, "word/document.xml");

    assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
    assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/>"#));
    assert!(xml.contains("Perencanaan Pembelajaran Mendalam TP ke-2"));
    assert!(xml.contains("Mata Pelajaran: Fiqih"));
    assert_eq!(xml.matches("<w:tbl>").count(), 1);
    assert_eq!(xml.matches("<w:tblHeader/>").count(), 1);
    assert!(xml.contains(r#"<w:t xml:space="preserve">Diskusi</w:t>"#));
    assert!(xml.contains(r#"<w:t xml:space="preserve">catatan</w:t>"#));
    assert!(xml.contains(
        r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">Bu Aisyah</w:t></w:r>"#
    ));
}

#[test]
fn recap_is_written_and_read_back() {
    let form = form();
    let analysis: ObjectivesAnalysis = serde_json::from_str(ANALYSIS).unwrap();
    let sequence: LearningSequence = serde_json::from_str(SEQUENCE).unwrap();
    let document = Document::recap(Some(&form), Some(&analysis), Some(&sequence), "HARMAJI");

    let dir = tempfile::tempdir().unwrap();
    let name = recap_filename(Some(&form));
    assert_eq!(name, "Kurikulum_Mendalam_Rekap_Fiqih_2024_2025.docx");
    let path = dir.path().join(&name);
    std::fs::write(&path, to_docx(&document).unwrap()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let xml = read_part(&bytes, "word/document.xml");
    assert_eq!(xml.matches("<w:tbl>").count(), 2);
    assert_eq!(xml.matches("<w:tblHeader/>").count(), 2);
    assert!(xml.contains("II. Hasil Analisis Tujuan Pembelajaran (Ganjil Semester)"));
    assert!(xml.contains("III. Alur Tujuan Pembelajaran (ATP)"));
    assert!(xml.contains("Mempraktikkan wudhu &amp; tayamum"));
    assert!(xml.contains("Keimanan dan Ketakwaan terhadap Tuhan YME, Kemandirian"));
    assert!(xml.contains("Tahun Pelajaran: 2024/2025"));

    let styles = read_part(&bytes, "word/styles.xml");
    assert!(styles.contains(r#"w:styleId="TableGrid""#));
}

#[test]
fn empty_markdown_is_a_valid_package() {
    let bytes = markdown_to_docx("").unwrap();
    let xml = read_part(&bytes, "word/document.xml");
    assert!(xml.contains("<w:body><w:sectPr>"));
    assert!(read_part(&bytes, "_rels/.rels").contains("word/document.xml"));
}

#[test]
fn recap_renders_to_typst_tables() {
    let analysis: ObjectivesAnalysis = serde_json::from_str(ANALYSIS).unwrap();
    let sequence: LearningSequence = serde_json::from_str(SEQUENCE).unwrap();
    let document = Document::recap(Some(&form()), Some(&analysis), Some(&sequence), "HARMAJI");
    let markup = document_to_typst(&document);
    assert!(markup.contains("#table(\n  columns: 6,\n  [#strong[No]],"));
    assert!(markup.contains("#table(\n  columns: 9,\n"));
    assert!(markup.contains("#align(center)[Oleh: Bu Aisyah]"));
}
