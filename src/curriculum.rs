//! Curriculum vocabulary, the lesson input form, and the structured results
//! returned by the objectives and learning-sequence generation steps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DefaultsConfig;
use crate::error::FormError;

/// Most learning outcomes a single form may carry.
pub const MAX_LEARNING_OUTCOMES: usize = 6;

/// Curriculum phase (fase), each spanning one or more grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Phase {
    pub const ALL: [Phase; 6] = [Phase::A, Phase::B, Phase::C, Phase::D, Phase::E, Phase::F];

    pub fn code(self) -> &'static str {
        match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
            Phase::D => "D",
            Phase::E => "E",
            Phase::F => "F",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::A => "Fase A (Kelas 1-2 SD/MI)",
            Phase::B => "Fase B (Kelas 3-4 SD/MI)",
            Phase::C => "Fase C (Kelas 5-6 SD/MI)",
            Phase::D => "Fase D (Kelas 7-9 SMP/MTs)",
            Phase::E => "Fase E (Kelas 10 SMA/MA)",
            Phase::F => "Fase F (Kelas 11-12 SMA/MA)",
        }
    }

    pub fn grades(self) -> &'static [Grade] {
        match self {
            Phase::A => &[Grade::G1, Grade::G2],
            Phase::B => &[Grade::G3, Grade::G4],
            Phase::C => &[Grade::G5, Grade::G6],
            Phase::D => &[Grade::G7, Grade::G8, Grade::G9],
            Phase::E => &[Grade::G10],
            Phase::F => &[Grade::G11, Grade::G12],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// School grade (kelas) 1 through 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "1")]
    G1,
    #[serde(rename = "2")]
    G2,
    #[serde(rename = "3")]
    G3,
    #[serde(rename = "4")]
    G4,
    #[serde(rename = "5")]
    G5,
    #[serde(rename = "6")]
    G6,
    #[serde(rename = "7")]
    G7,
    #[serde(rename = "8")]
    G8,
    #[serde(rename = "9")]
    G9,
    #[serde(rename = "10")]
    G10,
    #[serde(rename = "11")]
    G11,
    #[serde(rename = "12")]
    G12,
}

impl Grade {
    pub fn number(self) -> u8 {
        match self {
            Grade::G1 => 1,
            Grade::G2 => 2,
            Grade::G3 => 3,
            Grade::G4 => 4,
            Grade::G5 => 5,
            Grade::G6 => 6,
            Grade::G7 => 7,
            Grade::G8 => 8,
            Grade::G9 => 9,
            Grade::G10 => 10,
            Grade::G11 => 11,
            Grade::G12 => 12,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            Grade::G1 | Grade::G2 => Phase::A,
            Grade::G3 | Grade::G4 => Phase::B,
            Grade::G5 | Grade::G6 => Phase::C,
            Grade::G7 | Grade::G8 | Grade::G9 => Phase::D,
            Grade::G10 => Phase::E,
            Grade::G11 | Grade::G12 => Phase::F,
        }
    }

    pub fn label(self) -> String {
        format!("Kelas {}", self.number())
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Semester {
    #[serde(rename = "Ganjil")]
    Odd,
    #[serde(rename = "Genap")]
    Even,
}

impl Semester {
    pub const ALL: [Semester; 2] = [Semester::Odd, Semester::Even];

    pub fn label(self) -> &'static str {
        match self {
            Semester::Odd => "Ganjil",
            Semester::Even => "Genap",
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Values of the love-based curriculum (Kurikulum Berbasis Cinta).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KbcValue {
    #[serde(rename = "Cinta Allah dan Rasul-Nya")]
    LoveOfGodAndProphet,
    #[serde(rename = "Cinta Ilmu")]
    LoveOfKnowledge,
    #[serde(rename = "Cinta Diri dan Sesama")]
    LoveOfSelfAndOthers,
    #[serde(rename = "Cinta Alam")]
    LoveOfNature,
    #[serde(rename = "Cinta Bangsa dan Negara")]
    LoveOfNation,
}

impl KbcValue {
    pub const ALL: [KbcValue; 5] = [
        KbcValue::LoveOfGodAndProphet,
        KbcValue::LoveOfKnowledge,
        KbcValue::LoveOfSelfAndOthers,
        KbcValue::LoveOfNature,
        KbcValue::LoveOfNation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            KbcValue::LoveOfGodAndProphet => "Cinta Allah dan Rasul-Nya",
            KbcValue::LoveOfKnowledge => "Cinta Ilmu",
            KbcValue::LoveOfSelfAndOthers => "Cinta Diri dan Sesama",
            KbcValue::LoveOfNature => "Cinta Alam",
            KbcValue::LoveOfNation => "Cinta Bangsa dan Negara",
        }
    }
}

/// Graduate profile dimensions (Dimensi Profil Lulusan).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileDimension {
    #[serde(rename = "Keimanan dan Ketakwaan terhadap Tuhan YME")]
    Faith,
    #[serde(rename = "Kewargaan")]
    Citizenship,
    #[serde(rename = "Penalaran Kritis")]
    CriticalReasoning,
    #[serde(rename = "Kreativitas")]
    Creativity,
    #[serde(rename = "Kolaborasi")]
    Collaboration,
    #[serde(rename = "Kemandirian")]
    Independence,
    #[serde(rename = "Kesehatan")]
    Health,
    #[serde(rename = "Komunikasi")]
    Communication,
}

impl ProfileDimension {
    pub const ALL: [ProfileDimension; 8] = [
        ProfileDimension::Faith,
        ProfileDimension::Citizenship,
        ProfileDimension::CriticalReasoning,
        ProfileDimension::Creativity,
        ProfileDimension::Collaboration,
        ProfileDimension::Independence,
        ProfileDimension::Health,
        ProfileDimension::Communication,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProfileDimension::Faith => "Keimanan dan Ketakwaan terhadap Tuhan YME",
            ProfileDimension::Citizenship => "Kewargaan",
            ProfileDimension::CriticalReasoning => "Penalaran Kritis",
            ProfileDimension::Creativity => "Kreativitas",
            ProfileDimension::Collaboration => "Kolaborasi",
            ProfileDimension::Independence => "Kemandirian",
            ProfileDimension::Health => "Kesehatan",
            ProfileDimension::Communication => "Komunikasi",
        }
    }
}

pub fn join_dimensions(dimensions: &[ProfileDimension], separator: &str) -> String {
    dimensions
        .iter()
        .map(|d| d.label())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Lesson metadata collected from the teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonForm {
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub teacher: String,
    pub subject: String,
    pub phase: Phase,
    pub grade: Grade,
    #[serde(default)]
    pub academic_year: String,
    pub semester: Semester,
    pub learning_outcomes: Vec<String>,
}

impl LessonForm {
    /// Fill blank identity fields from the configured defaults.
    pub fn fill_defaults(&mut self, defaults: &DefaultsConfig) {
        if self.institution.trim().is_empty() {
            self.institution = defaults.institution.clone();
        }
        if self.teacher.trim().is_empty() {
            self.teacher = defaults.teacher.clone();
        }
        if self.academic_year.trim().is_empty() {
            self.academic_year = defaults.academic_year.clone();
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.subject.trim().is_empty() {
            return Err(FormError::MissingField("subject"));
        }
        if self.grade.phase() != self.phase {
            return Err(FormError::GradeOutsidePhase {
                grade: self.grade,
                phase: self.phase,
            });
        }
        let count = self.learning_outcomes.len();
        if count == 0 || count > MAX_LEARNING_OUTCOMES {
            return Err(FormError::OutcomeCount(count));
        }
        if let Some(index) = self
            .learning_outcomes
            .iter()
            .position(|outcome| outcome.trim().is_empty())
        {
            return Err(FormError::BlankOutcome(index + 1));
        }
        Ok(())
    }
}

/// One learning objective derived from a learning outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveDetail {
    pub no: u32,
    pub content: String,
    pub competency: String,
    pub subject_matter: String,
    pub objective: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeAnalysis {
    pub learning_outcome: String,
    pub details: Vec<ObjectiveDetail>,
}

/// Result of the learning objectives (TP) generation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectivesAnalysis {
    pub semester: Semester,
    pub analyses: Vec<OutcomeAnalysis>,
}

/// A flattened analysis row, numbered across all outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveRow {
    pub no: u32,
    pub learning_outcome: String,
    pub content: String,
    pub competency: String,
    pub subject_matter: String,
    pub objective: String,
}

impl ObjectivesAnalysis {
    pub fn flatten(&self) -> Vec<ObjectiveRow> {
        self.analyses
            .iter()
            .flat_map(|analysis| {
                analysis.details.iter().map(move |detail| (analysis, detail))
            })
            .zip(1..)
            .map(|((analysis, detail), no)| ObjectiveRow {
                no,
                learning_outcome: analysis.learning_outcome.clone(),
                content: detail.content.clone(),
                competency: detail.competency.clone(),
                subject_matter: detail.subject_matter.clone(),
                objective: detail.objective.clone(),
            })
            .collect()
    }

    pub fn objectives(&self) -> impl Iterator<Item = &str> {
        self.analyses
            .iter()
            .flat_map(|a| a.details.iter().map(|d| d.objective.as_str()))
    }

    pub fn subject_matters(&self) -> impl Iterator<Item = &str> {
        self.analyses
            .iter()
            .flat_map(|a| a.details.iter().map(|d| d.subject_matter.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    /// Markdown table for terminal display.
    pub fn to_markdown(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .flatten()
            .into_iter()
            .map(|row| {
                vec![
                    row.no.to_string(),
                    row.learning_outcome,
                    row.content,
                    row.competency,
                    row.subject_matter,
                    row.objective,
                ]
            })
            .collect();
        markdown_table(&OBJECTIVE_COLUMNS, &rows)
    }
}

/// One step of the learning sequence (ATP).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceItem {
    pub no: u32,
    pub objective: String,
    pub indicator: String,
    pub subject_matter: String,
    pub kbc_values: String,
    pub time_allocation: String,
    pub profile_dimensions: Vec<ProfileDimension>,
    pub assessment: String,
    pub learning_resources: String,
}

impl SequenceItem {
    /// Minutes named in the time allocation, e.g. 90 for "90 Menit (2 JP)".
    pub fn allocated_minutes(&self) -> u32 {
        self.time_allocation
            .split(|c: char| !c.is_ascii_digit())
            .find(|digits| !digits.is_empty())
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(0)
    }
}

/// Result of the learning sequence (ATP) generation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSequence {
    pub items: Vec<SequenceItem>,
}

impl LearningSequence {
    pub fn item(&self, no: u32) -> Option<&SequenceItem> {
        self.items.iter().find(|item| item.no == no)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_markdown(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .items
            .iter()
            .map(|item| {
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
            })
            .collect();
        markdown_table(&SEQUENCE_COLUMNS, &rows)
    }
}

pub const OBJECTIVE_COLUMNS: [&str; 6] = [
    "No",
    "Capaian Pembelajaran",
    "Konten Pembelajaran",
    "Kompetensi",
    "Materi Pokok",
    "Tujuan Pembelajaran",
];

pub const SEQUENCE_COLUMNS: [&str; 9] = [
    "No",
    "Tujuan Pembelajaran",
    "Indikator",
    "Materi Pokok",
    "Nilai KBC",
    "Alokasi Waktu",
    "Dimensi Profil Lulusan",
    "Asesmen",
    "Sumber Belajar",
];

fn markdown_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", columns.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(columns.len())));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| escape_cell(cell)).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}
