//! Prompt text and response schemas for the three generation requests.

use serde_json::{Value, json};

use crate::curriculum::{
    KbcValue, LessonForm, ObjectivesAnalysis, ProfileDimension, Semester, SequenceItem,
    join_dimensions,
};

/// Objectives per learning outcome requested from the model.
pub const OBJECTIVES_PER_OUTCOME: usize = 6;

fn kbc_list() -> String {
    KbcValue::ALL
        .iter()
        .map(|value| format!("- {}", value.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn dimension_labels(separator: &str) -> String {
    join_dimensions(&ProfileDimension::ALL, separator)
}

fn identity_lines(form: &LessonForm) -> String {
    format!(
        "- Nama Madrasah: {}\n- Nama Guru: {}\n- Mata Pelajaran: {}\n- Fase: {}\n- Kelas: {}\n- Semester: {}",
        form.institution, form.teacher, form.subject, form.phase, form.grade, form.semester
    )
}

pub fn objectives_prompt(form: &LessonForm) -> String {
    let outcomes = form
        .learning_outcomes
        .iter()
        .enumerate()
        .map(|(i, cp)| format!("- CP {}: {}", i + 1, cp))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Sebagai seorang pakar kurikulum dan pengembang pembelajaran di madrasah, bantu saya menghasilkan analisis Tujuan Pembelajaran (TP) mendalam yang terintegrasi dengan kurikulum deep learning dan kurikulum berbasis cinta (KBC).

Berikut adalah detail input:
{identity}
- Tahun Pelajaran: {year}
- Capaian Pembelajaran (CP) yang akan dianalisis:
{outcomes}

Untuk setiap Capaian Pembelajaran yang diberikan, saya membutuhkan {per} set (materi pokok, kompetensi, konten pembelajaran, tujuan pembelajaran). Setiap Tujuan Pembelajaran harus secara eksplisit mengintegrasikan nilai-nilai Kurikulum Berbasis Cinta (KBC).

Nilai KBC yang harus dipertimbangkan untuk integrasi:
{kbc}

Pastikan outputnya terstruktur dalam format JSON yang valid, mengikuti skema berikut:

```json
{{
  "semester": "{semester}",
  "analyses": [
    {{
      "learningOutcome": "Capaian Pembelajaran 1",
      "details": [
        {{
          "no": 1,
          "content": "Konten Pembelajaran untuk TP 1",
          "competency": "Kompetensi untuk TP 1",
          "subjectMatter": "Materi Pokok untuk TP 1",
          "objective": "Tujuan Pembelajaran 1 yang mengintegrasikan KBC"
        }}
      ]
    }}
  ]
}}
```
"#,
        identity = identity_lines(form),
        year = form.academic_year,
        outcomes = outcomes,
        per = OBJECTIVES_PER_OUTCOME,
        kbc = kbc_list(),
        semester = form.semester,
    )
}

fn object(properties: Value, order: &[&str]) -> Value {
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": order,
        "propertyOrdering": order,
    })
}

pub fn objectives_schema(semester: Semester) -> Value {
    let detail = object(
        json!({
            "no": { "type": "INTEGER" },
            "content": { "type": "STRING" },
            "competency": { "type": "STRING" },
            "subjectMatter": { "type": "STRING" },
            "objective": { "type": "STRING" },
        }),
        &["no", "content", "competency", "subjectMatter", "objective"],
    );
    let analysis = object(
        json!({
            "learningOutcome": { "type": "STRING" },
            "details": { "type": "ARRAY", "items": detail },
        }),
        &["learningOutcome", "details"],
    );
    object(
        json!({
            "semester": { "type": "STRING", "enum": [semester.label()] },
            "analyses": { "type": "ARRAY", "items": analysis },
        }),
        &["semester", "analyses"],
    )
}

pub fn sequence_prompt(form: &LessonForm, analysis: &ObjectivesAnalysis) -> String {
    let objectives = analysis
        .objectives()
        .enumerate()
        .map(|(i, tp)| format!("{}. {}", i + 1, tp))
        .collect::<Vec<_>>()
        .join("\n");
    let subject_matters = analysis.subject_matters().collect::<Vec<_>>().join("; ");

    format!(
        r#"Sebagai seorang pakar kurikulum, buatlah Alur Tujuan Pembelajaran (ATP) dari daftar Tujuan Pembelajaran (TP) yang telah diberikan.

Berikut adalah detail konteks:
{identity}

Daftar Tujuan Pembelajaran yang akan dibuatkan ATP-nya:
{objectives}

Materi Pokok yang tersedia: {subject_matters}

Untuk setiap Tujuan Pembelajaran, hasilkan Indikator, Materi Pokok (ambil dari yang sudah diberikan), nilai KBC yang relevan (jelaskan kenapa sesuai), Alokasi Waktu yang realistis (contoh: "90 Menit (2 JP)"), Dimensi Profil Lulusan yang sesuai (pilih dari daftar ini: {dimensions}), Asesmen yang cocok, dan Sumber Belajar.

Pastikan outputnya terstruktur dalam format JSON yang valid, mengikuti skema berikut:

```json
{{
  "items": [
    {{
      "no": 1,
      "objective": "Tujuan Pembelajaran dari daftar di atas",
      "indicator": "Indikator pencapaian tujuan pembelajaran ini",
      "subjectMatter": "Materi Pokok yang sesuai dari daftar di atas",
      "kbcValues": "Nilai KBC yang sesuai beserta alasannya",
      "timeAllocation": "90 Menit (2 JP)",
      "profileDimensions": ["Dimensi 1", "Dimensi 2"],
      "assessment": "Jenis asesmen yang sesuai",
      "learningResources": "Buku teks, video edukasi, lingkungan sekitar"
    }}
  ]
}}
```
"#,
        identity = identity_lines(form),
        objectives = objectives,
        subject_matters = subject_matters,
        dimensions = dimension_labels(", "),
    )
}

pub fn sequence_schema() -> Value {
    let dimensions: Vec<&str> = ProfileDimension::ALL.iter().map(|d| d.label()).collect();
    let item = object(
        json!({
            "no": { "type": "INTEGER" },
            "objective": { "type": "STRING" },
            "indicator": { "type": "STRING" },
            "subjectMatter": { "type": "STRING" },
            "kbcValues": { "type": "STRING" },
            "timeAllocation": { "type": "STRING" },
            "profileDimensions": {
                "type": "ARRAY",
                "items": { "type": "STRING", "enum": dimensions },
            },
            "assessment": { "type": "STRING" },
            "learningResources": { "type": "STRING" },
        }),
        &[
            "no",
            "objective",
            "indicator",
            "subjectMatter",
            "kbcValues",
            "timeAllocation",
            "profileDimensions",
            "assessment",
            "learningResources",
        ],
    );
    object(
        json!({ "items": { "type": "ARRAY", "items": item } }),
        &["items"],
    )
}

/// Opening, core and closing activity minutes: 15% / 70% / 15% rounded.
pub fn activity_minutes(total: u32) -> (u32, u32, u32) {
    let share = |ratio: f64| (f64::from(total) * ratio).round() as u32;
    (share(0.15), share(0.70), share(0.15))
}

pub fn lesson_plan_prompt(form: &LessonForm, item: &SequenceItem) -> String {
    let (opening, core, closing) = activity_minutes(item.allocated_minutes());
    let selected_dimensions = join_dimensions(&item.profile_dimensions, ", ");

    format!(
        r#"Sebagai seorang pengembang kurikulum yang ahli dalam pembelajaran mendalam (deep learning) dan integrasi nilai-nilai, buatkan Perencanaan Pembelajaran Mendalam yang sistematis dan komprehensif berdasarkan Tujuan Pembelajaran berikut.

**I. IDENTITAS**
{identity}
- Tahun Pelajaran: {year}

Detail Tujuan Pembelajaran yang dipilih untuk perencanaan ini:
- Tujuan Pembelajaran: {objective}
- Materi Pokok: {subject_matter}
- Indikator: {indicator}
- Nilai KBC: {kbc}
- Alokasi Waktu: {time}
- Dimensi Profil Lulusan: {selected_dimensions}
- Asesmen: {assessment}
- Sumber Belajar: {resources}

Integrasikan konsep pembelajaran mendalam (mindful, meaningful, joyful) dan kurikulum berbasis cinta (KBC) secara eksplisit dalam setiap bagian.

Berikan output dalam format Markdown yang rapi dan terstruktur, mengikuti sistematika berikut:

# Perencanaan Pembelajaran Mendalam
## TP ke-{no}

**I. IDENTITAS**
Nama Madrasah: {institution}
Nama Guru: {teacher}
Mata Pelajaran: {subject}
Fase: {phase}
Semester: {semester}

1.  **Materi Pelajaran**: Uraian materi yang diintegrasikan dengan nilai KBC ({kbc_values}).
2.  **Dimensi Profil Lulusan**: Kesesuaian tujuan pembelajaran dengan {all_dimensions}. Pilih dari: {selected_dimensions}.
3.  **Pokok Materi**: {subject_matter}

**II. DESAIN PEMBELAJARAN**
1.  **Capaian Pembelajaran**: Capaian pembelajaran yang relevan, diintegrasikan dengan nilai KBC.
2.  **Lintas Disiplin Ilmu**: Mata pelajaran lain yang sesuai.
3.  **Tujuan Pembelajaran**: {objective}
4.  **Praktik Pedagogis**: Model, Strategi, dan Metode yang sesuai.
5.  **Kemitraan Pembelajaran**: Laboran sekolah, guru lain, dan pihak dari luar sekolah.
6.  **Lingkungan Pembelajaran**: Fisik, Virtual, dan Budaya Belajar.
7.  **Pemanfaatan Digital**: Media digital yang terkait dengan materi.

**III. PENGALAMAN BELAJAR**
1.  **Kegiatan Awal** ({opening} Menit): Berkesadaran, Bermakna, Menggembirakan, dan langkah-langkah.
2.  **Kegiatan Inti** ({core} Menit): Berkesadaran, Bermakna, Menggembirakan, dan langkah-langkah rinci.
3.  **Kegiatan Penutup** ({closing} Menit): Berkesadaran, Bermakna, Menggembirakan, dan langkah-langkah.

**IV. ASESMEN PEMBELAJARAN**
1.  **Asesmen Awal Pembelajaran**
2.  **Asesmen Proses Pembelajaran (Formatif dan Sikap)**
3.  **Asesmen Akhir Pembelajaran (Sumatif)**

**Lampiran**
1.  **Lembar Kerja Peserta Didik (LKPD)** dengan judul dan tabel Markdown:
| No. | Kegiatan | Petunjuk | Hasil Pengamatan/Analisis |
|-----|----------|----------|---------------------------|
| 1   |          |          |                           |
2.  **Instrumen/Rubrik Penilaian**: rubrik kognitif, sikap (terintegrasi KBC), dan presentasi, masing-masing sebagai tabel Markdown:
| Level | Kriteria |
|-------|----------|
| 4     | Sangat Baik: ... |

Gunakan tabel Markdown dengan baris pemisah (|---|) dan jumlah kolom yang sama pada setiap baris.
"#,
        identity = identity_lines(form),
        year = form.academic_year,
        objective = item.objective,
        subject_matter = item.subject_matter,
        indicator = item.indicator,
        kbc = item.kbc_values,
        time = item.time_allocation,
        selected_dimensions = selected_dimensions,
        assessment = item.assessment,
        resources = item.learning_resources,
        no = item.no,
        institution = form.institution,
        teacher = form.teacher,
        subject = form.subject,
        phase = form.phase,
        semester = form.semester,
        kbc_values = KbcValue::ALL
            .iter()
            .map(|v| v.label())
            .collect::<Vec<_>>()
            .join("; "),
        all_dimensions = dimension_labels("; "),
        opening = opening,
        core = core,
        closing = closing,
    )
}
