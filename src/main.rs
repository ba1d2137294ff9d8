use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use lessonplan::{
    Alignment, Block, Config, CurriculumGenerator, Document, GeminiClient, KbcValue,
    LearningSequence, LessonForm, ObjectivesAnalysis, Paragraph, ParagraphStyle, Phase,
    ProfileDimension, Semester, Spacing, lesson_plan_filename, recap_filename,
};

#[derive(Parser)]
#[command(name = "lessonplan")]
#[command(about = "Generate lesson objectives and plans, and export them as documents")]
#[command(version)]
struct Cli {
    /// Configuration file (compiled defaults are used when it does not exist)
    #[arg(long, global = true, default_value = "lessonplan.toml")]
    config: PathBuf,

    /// Log level filter, overriding the configured one
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a Markdown file to a document
    Convert {
        /// Input Markdown file
        input: PathBuf,

        /// Output file (defaults to input name with the format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Docx)]
        format: Format,

        /// Centered title placed above the converted content
        #[arg(long)]
        title: Option<String>,
    },
    /// Generate the learning objectives analysis for a lesson form
    Objectives {
        /// Lesson form (TOML)
        #[arg(long)]
        form: PathBuf,

        /// Where to save the analysis (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate the learning sequence from an objectives analysis
    Sequence {
        #[arg(long)]
        form: PathBuf,

        /// Objectives analysis produced by `objectives` (JSON)
        #[arg(long)]
        objectives: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate lesson plans for items of a learning sequence
    Plan {
        #[arg(long)]
        form: PathBuf,

        /// Learning sequence produced by `sequence` (JSON)
        #[arg(long)]
        sequence: PathBuf,

        /// Only plan this item number
        #[arg(long)]
        item: Option<u32>,

        /// Save each plan as a .docx instead of printing Markdown
        #[arg(long)]
        docx: bool,
    },
    /// Export the recap document
    Export {
        #[arg(long)]
        form: PathBuf,

        #[arg(long)]
        objectives: Option<PathBuf>,

        #[arg(long)]
        sequence: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List phases, grades, semesters and curriculum values
    Options,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Docx,
    Pdf,
    Typst,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Docx => "docx",
            Format::Pdf => "pdf",
            Format::Typst => "typ",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    lessonplan::logging::init_logger(level, config.logging.json);

    match cli.command {
        Commands::Convert {
            input,
            output,
            format,
            title,
        } => convert(&input, output, format, title.as_deref()),
        Commands::Objectives { form, output } => {
            let form = read_form(&form, &config)?;
            let generator = generator(&config)?;
            let analysis = generator.objectives(&form).await?;
            let output = output.unwrap_or_else(|| output_path(&config, "objectives.json"));
            write_json(&output, &analysis)?;
            println!("{}", analysis.to_markdown());
            println!("Saved {}", output.display());
            Ok(())
        }
        Commands::Sequence {
            form,
            objectives,
            output,
        } => {
            let form = read_form(&form, &config)?;
            let analysis: ObjectivesAnalysis = read_json(&objectives)?;
            if analysis.is_empty() {
                bail!("{} holds no learning objectives", objectives.display());
            }
            let generator = generator(&config)?;
            let sequence = generator.sequence(&form, &analysis).await?;
            let output = output.unwrap_or_else(|| output_path(&config, "sequence.json"));
            write_json(&output, &sequence)?;
            println!("{}", sequence.to_markdown());
            println!("Saved {}", output.display());
            Ok(())
        }
        Commands::Plan {
            form,
            sequence,
            item,
            docx,
        } => {
            let form = read_form(&form, &config)?;
            let sequence: LearningSequence = read_json(&sequence)?;
            let items = match item {
                Some(no) => vec![
                    sequence
                        .item(no)
                        .with_context(|| format!("no learning sequence item {no}"))?,
                ],
                None => sequence.items.iter().collect(),
            };
            let generator = generator(&config)?;
            for item in items {
                let markdown = generator.lesson_plan(&form, item).await?;
                if docx {
                    let document = Document::lesson_plan(
                        &markdown,
                        item.no,
                        Some(&form),
                        &config.defaults.teacher,
                    );
                    let output = output_path(&config, &lesson_plan_filename(item.no, Some(&form)));
                    write_bytes(&output, &lessonplan::to_docx(&document)?)?;
                    println!("Saved {}", output.display());
                } else {
                    println!("{markdown}\n");
                }
            }
            Ok(())
        }
        Commands::Export {
            form,
            objectives,
            sequence,
            output,
        } => {
            let form = read_form(&form, &config)?;
            let analysis: Option<ObjectivesAnalysis> =
                objectives.as_deref().map(read_json).transpose()?;
            let sequence: Option<LearningSequence> =
                sequence.as_deref().map(read_json).transpose()?;
            let document = Document::recap(
                Some(&form),
                analysis.as_ref(),
                sequence.as_ref(),
                &config.defaults.teacher,
            );
            let output =
                output.unwrap_or_else(|| output_path(&config, &recap_filename(Some(&form))));
            write_bytes(&output, &lessonplan::to_docx(&document)?)?;
            println!("Saved {}", output.display());
            Ok(())
        }
        Commands::Options => {
            print_options();
            Ok(())
        }
    }
}

fn convert(input: &Path, output: Option<PathBuf>, format: Format, title: Option<&str>) -> Result<()> {
    let markdown = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let mut document = Document::from_markdown(&markdown);
    if let Some(title) = title {
        let mut blocks: Vec<Block> = vec![
            Paragraph::text(title)
                .with_style(ParagraphStyle::Title)
                .with_alignment(Alignment::Center)
                .into(),
            Paragraph::spacer(Spacing::SECTION).into(),
        ];
        blocks.append(&mut document.blocks);
        document.blocks = blocks;
    }

    let output = output.unwrap_or_else(|| input.with_extension(format.extension()));
    let title = document.title_text().unwrap_or_default();
    info!(
        input = %input.display(),
        output = %output.display(),
        title = %title,
        blocks = document.blocks.len(),
        "Converting"
    );

    match format {
        Format::Docx => write_bytes(&output, &lessonplan::to_docx(&document)?)?,
        Format::Pdf => write_bytes(&output, &lessonplan::document_to_pdf(&document)?)?,
        Format::Typst => write_bytes(&output, lessonplan::document_to_typst(&document).as_bytes())?,
    }

    println!("Created {}", output.display());
    Ok(())
}

fn generator(config: &Config) -> Result<CurriculumGenerator<GeminiClient>> {
    let client = GeminiClient::from_config(&config.generation)?;
    Ok(CurriculumGenerator::new(
        client,
        config.generation.model.clone(),
        config.generation.retry_policy(),
    ))
}

fn read_form(path: &Path, config: &Config) -> Result<LessonForm> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading form {}", path.display()))?;
    let mut form: LessonForm =
        toml::from_str(&content).with_context(|| format!("parsing form {}", path.display()))?;
    form.fill_defaults(&config.defaults);
    form.validate()
        .with_context(|| format!("invalid form {}", path.display()))?;
    Ok(form)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_bytes(path, json.as_bytes())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn output_path(config: &Config, file_name: &str) -> PathBuf {
    Path::new(&config.export.output_dir).join(file_name)
}

fn print_options() {
    println!("Phases:");
    for phase in Phase::ALL {
        let grades: Vec<String> = phase.grades().iter().map(|g| g.label()).collect();
        println!("  {}  {}  [{}]", phase.code(), phase.label(), grades.join(", "));
    }
    println!("Semesters:");
    for semester in Semester::ALL {
        println!("  {}", semester.label());
    }
    println!("Love-based curriculum values:");
    for value in KbcValue::ALL {
        println!("  {}", value.label());
    }
    println!("Graduate profile dimensions:");
    for dimension in ProfileDimension::ALL {
        println!("  {}", dimension.label());
    }
}
