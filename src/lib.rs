mod block;
mod config;
mod curriculum;
mod document;
mod docx;
mod error;
mod generation;
mod inline;
pub mod logging;
mod parser;
mod prompt;
mod typst;

pub use block::{
    Alignment, Block, Paragraph, ParagraphStyle, Spacing, Table, TableCell, TableRow, TextRun,
};
pub use config::{Config, DefaultsConfig, ExportConfig, GenerationConfig, LoggingConfig};
pub use curriculum::{
    Grade, KbcValue, LearningSequence, LessonForm, MAX_LEARNING_OUTCOMES, ObjectiveDetail,
    ObjectiveRow, ObjectivesAnalysis, OutcomeAnalysis, Phase, ProfileDimension, Semester,
    SequenceItem, join_dimensions,
};
pub use document::{Document, lesson_plan_filename, recap_filename, sanitize_filename_part};
pub use docx::to_docx;
pub use error::{ConfigError, ExportError, FormError, GenerationError};
pub use generation::{
    CurriculumGenerator, GeminiClient, GenerationRequest, ResponseFormat, RetryPolicy,
    TextGenerator, with_retry,
};
pub use inline::parse_inline_formatting;
pub use prompt::activity_minutes;

use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_pdf::PdfOptions;

/// Parse markdown text into a vector of blocks.
pub fn parse(markdown: &str) -> Vec<Block> {
    parser::parse(markdown)
}

/// Convert markdown to `.docx` bytes.
pub fn markdown_to_docx(markdown: &str) -> Result<Vec<u8>, ExportError> {
    docx::to_docx(&Document::from_markdown(markdown))
}

/// Convert markdown to Typst markup.
pub fn markdown_to_typst(markdown: &str) -> String {
    let blocks = parse(markdown);
    typst::blocks_to_typst(&blocks)
}

/// Render an assembled document to Typst markup.
pub fn document_to_typst(document: &Document) -> String {
    typst::blocks_to_typst(&document.blocks)
}

/// Convert markdown to PDF bytes.
pub fn markdown_to_pdf(markdown: &str) -> Result<Vec<u8>, ExportError> {
    document_to_pdf(&Document::from_markdown(markdown))
}

/// Compile an assembled document to PDF bytes.
pub fn document_to_pdf(document: &Document) -> Result<Vec<u8>, ExportError> {
    use typst_library::layout::PagedDocument;

    let typst_content = document_to_typst(document);

    let font_options = TypstKitFontOptions::new()
        .include_embedded_fonts(true)
        .include_system_fonts(false);

    let engine = TypstEngine::builder()
        .main_file(typst_content)
        .search_fonts_with(font_options)
        .build();

    let doc: PagedDocument = engine
        .compile()
        .output
        .map_err(|e| ExportError::Pdf(format!("Typst compilation failed: {:?}", e)))?;

    typst_pdf::pdf(&doc, &PdfOptions::default())
        .map_err(|e| ExportError::Pdf(format!("PDF generation failed: {:?}", e)))
}
