//! Manuscript export from stored chapter outputs.

use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context as _, Result};
use docx_rs::{Docx, Paragraph, Run, Style, StyleType};
use serde::{Deserialize, Serialize};

use crate::pack::ChapterOutput;

/// Output format for [`export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Txt,
    Markdown,
    Docx,
}

impl ExportFormat {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Txt => "novel.txt",
            Self::Markdown => "novel.md",
            Self::Docx => "novel.docx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Txt => write!(f, "txt"),
            Self::Markdown => write!(f, "markdown"),
            Self::Docx => write!(f, "docx"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "md" | "markdown" => Ok(Self::Markdown),
            "docx" | "word" => Ok(Self::Docx),
            other => Err(format!(
                "unknown export format '{other}' (expected txt, markdown or docx)"
            )),
        }
    }
}

/// One exported chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterText {
    pub chapter_no: u32,
    pub prose: String,
}

/// Result of an export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub chapters: Vec<u32>,
}

/// Collect prose from every `NNNN/output.md` under `chapters_dir`, ordered
/// by chapter number. Only folders named the way chapters are stored (four
/// digits, zero-padded; wider for chapter 10000 and up) are read.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or an output cannot be
/// read.
pub fn gather_chapters(chapters_dir: &Path) -> Result<Vec<ChapterText>> {
    if !chapters_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut chapters = Vec::new();
    for entry in fs::read_dir(chapters_dir)
        .with_context(|| format!("failed to list {}", chapters_dir.display()))?
    {
        let entry = entry.with_context(|| format!("failed to list {}", chapters_dir.display()))?;
        let name = entry.file_name();
        let Some(chapter_no) = name.to_str().and_then(parse_chapter_dir) else {
            continue;
        };
        let output = entry.path().join("output.md");
        if !output.is_file() {
            continue;
        }
        let stored = fs::read_to_string(&output)
            .with_context(|| format!("failed to read {}", output.display()))?;
        chapters.push(ChapterText {
            chapter_no,
            prose: ChapterOutput::prose_of(&stored),
        });
    }

    chapters.sort_by_key(|c| c.chapter_no);
    Ok(chapters)
}

fn parse_chapter_dir(name: &str) -> Option<u32> {
    if name.len() < 4 || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let chapter_no: u32 = name.parse().ok()?;
    (format!("{chapter_no:04}") == name).then_some(chapter_no)
}

fn paragraphs(prose: &str) -> impl Iterator<Item = &str> {
    prose.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}

/// Plain text: `# Chapter N`, a blank line, the prose.
#[must_use]
pub fn render_txt(chapters: &[ChapterText]) -> String {
    let mut out = String::new();
    for chapter in chapters {
        out.push_str(&format!("# Chapter {}\n\n{}\n\n", chapter.chapter_no, chapter.prose));
    }
    out
}

/// Markdown: a level-two heading per chapter, paragraphs separated by blank
/// lines with stray whitespace removed.
#[must_use]
pub fn render_markdown(title: &str, chapters: &[ChapterText]) -> String {
    let mut out = String::new();
    if !title.trim().is_empty() {
        out.push_str(&format!("# {}\n\n", title.trim()));
    }
    for chapter in chapters {
        out.push_str(&format!("## Chapter {}\n\n", chapter.chapter_no));
        for paragraph in paragraphs(&chapter.prose) {
            out.push_str(paragraph);
            out.push_str("\n\n");
        }
    }
    out
}

/// Style id of the per-chapter heading in docx exports.
pub const DOCX_HEADING_STYLE: &str = "Heading1";

/// Word document: a `Chapter N` level-one heading per chapter, then one
/// paragraph per prose block.
///
/// # Errors
///
/// Returns an error if the document archive cannot be assembled.
pub fn render_docx(chapters: &[ChapterText]) -> Result<Vec<u8>> {
    let heading = Style::new(DOCX_HEADING_STYLE, StyleType::Paragraph)
        .name("Heading 1")
        .size(32)
        .bold();
    let mut doc = Docx::new().add_style(heading);
    for chapter in chapters {
        doc = doc.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(format!("Chapter {}", chapter.chapter_no)))
                .style(DOCX_HEADING_STYLE),
        );
        for paragraph in paragraphs(&chapter.prose) {
            doc = doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(paragraph)));
        }
    }

    let mut buf = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buf)
        .context("failed to assemble docx archive")?;
    Ok(buf.into_inner())
}

/// Write the manuscript in `format` into `exports_dir`.
///
/// # Errors
///
/// Returns an error if chapters cannot be read or the export cannot be
/// written.
pub fn export(
    chapters_dir: &Path,
    exports_dir: &Path,
    format: ExportFormat,
    title: &str,
) -> Result<ExportReport> {
    let chapters = gather_chapters(chapters_dir)?;
    let body = match format {
        ExportFormat::Txt => render_txt(&chapters).into_bytes(),
        ExportFormat::Markdown => render_markdown(title, &chapters).into_bytes(),
        ExportFormat::Docx => render_docx(&chapters)?,
    };

    fs::create_dir_all(exports_dir)
        .with_context(|| format!("failed to create {}", exports_dir.display()))?;
    let path = exports_dir.join(format.file_name());
    fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(%format, path = %path.display(), chapters = chapters.len(), "manuscript exported");
    Ok(ExportReport {
        format,
        path,
        chapters: chapters.iter().map(|c| c.chapter_no).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;
    use tempfile::TempDir;

    fn document_xml(archive: &[u8]) -> String {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).expect("docx is a zip archive");
        let mut xml = String::new();
        zip.by_name("word/document.xml")
            .expect("document part")
            .read_to_string(&mut xml)
            .expect("utf8 xml");
        xml
    }

    fn write_chapter(root: &Path, dir: &str, prose: &str) {
        let folder = root.join(dir);
        fs::create_dir_all(&folder).expect("mkdir");
        let out = ChapterOutput {
            prose: prose.to_string(),
            pack_raw: "{}".to_string(),
        };
        fs::write(folder.join("output.md"), out.render()).expect("write");
    }

    #[test]
    fn gathers_four_digit_folders_in_order() {
        let dir = TempDir::new().expect("tempdir");
        write_chapter(dir.path(), "0010", "ten");
        write_chapter(dir.path(), "0002", "two");
        write_chapter(dir.path(), "draft", "skip");
        write_chapter(dir.path(), "00001", "skip");
        write_chapter(dir.path(), "012", "skip");
        fs::create_dir_all(dir.path().join("0003")).expect("mkdir");

        let chapters = gather_chapters(dir.path()).expect("gather");
        let numbers: Vec<u32> = chapters.iter().map(|c| c.chapter_no).collect();
        assert_eq!(numbers, vec![2, 10]);
        assert_eq!(chapters[0].prose, "two");
    }

    #[test]
    fn chapters_past_9999_are_gathered() {
        let dir = TempDir::new().expect("tempdir");
        write_chapter(dir.path(), "9999", "last padded");
        write_chapter(dir.path(), "10000", "first wide");
        write_chapter(dir.path(), "123456", "far out");

        let chapters = gather_chapters(dir.path()).expect("gather");
        let numbers: Vec<u32> = chapters.iter().map(|c| c.chapter_no).collect();
        assert_eq!(numbers, vec![9999, 10_000, 123_456]);
        assert_eq!(chapters[1].prose, "first wide");
    }

    #[test]
    fn txt_rendering() {
        let chapters = vec![
            ChapterText { chapter_no: 1, prose: "A.".into() },
            ChapterText { chapter_no: 2, prose: "B.".into() },
        ];
        assert_eq!(render_txt(&chapters), "# Chapter 1\n\nA.\n\n# Chapter 2\n\nB.\n\n");
    }

    #[test]
    fn markdown_rendering_normalises_paragraphs() {
        let chapters = vec![ChapterText {
            chapter_no: 1,
            prose: "First.  \n\n\n\n  Second.".into(),
        }];
        assert_eq!(
            render_markdown("Tides", &chapters),
            "# Tides\n\n## Chapter 1\n\nFirst.\n\nSecond.\n\n"
        );
    }

    #[test]
    fn export_writes_file_and_reports_chapters() {
        let dir = TempDir::new().expect("tempdir");
        let chapters = dir.path().join("chapters");
        write_chapter(&chapters, "0001", "Once.");
        let report = export(&chapters, &dir.path().join("exports"), ExportFormat::Markdown, "")
            .expect("export");
        assert_eq!(report.chapters, vec![1]);
        assert!(report.path.ends_with("novel.md"));
        assert_eq!(
            fs::read_to_string(report.path).expect("read"),
            "## Chapter 1\n\nOnce.\n\n"
        );
    }

    #[test]
    fn docx_has_a_heading_per_chapter_and_a_paragraph_per_block() {
        let chapters = vec![
            ChapterText { chapter_no: 1, prose: "Fog & rain.\n\nThe ferry left.".into() },
            ChapterText { chapter_no: 2, prose: "Ivo waited.".into() },
        ];
        let xml = document_xml(&render_docx(&chapters).expect("docx"));

        assert_eq!(xml.matches(DOCX_HEADING_STYLE).count(), 2);
        let first = xml.find("Chapter 1").expect("chapter 1 heading");
        let second = xml.find("Chapter 2").expect("chapter 2 heading");
        assert!(first < second);
        assert!(xml.contains("Fog &amp; rain."));
        assert!(xml.contains("The ferry left."));
        assert!(xml.find("Ivo waited.").is_some_and(|at| at > second));
    }

    #[test]
    fn docx_export_writes_novel_docx() {
        let dir = TempDir::new().expect("tempdir");
        let chapters = dir.path().join("chapters");
        write_chapter(&chapters, "0001", "Once.");
        let report = export(&chapters, &dir.path().join("exports"), ExportFormat::Docx, "Tides")
            .expect("export");
        assert!(report.path.ends_with("novel.docx"));
        let xml = document_xml(&fs::read(&report.path).expect("read"));
        assert!(xml.contains("Chapter 1"));
        assert!(xml.contains("Once."));
    }

    #[test]
    fn empty_project_exports_empty_file() {
        let dir = TempDir::new().expect("tempdir");
        let report = export(&dir.path().join("chapters"), dir.path(), ExportFormat::Txt, "")
            .expect("export");
        assert!(report.chapters.is_empty());
        assert_eq!(fs::read_to_string(report.path).expect("read"), "");
    }

    #[test]
    fn format_parsing() {
        assert_eq!("md".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert_eq!("TXT".parse::<ExportFormat>(), Ok(ExportFormat::Txt));
        assert_eq!("docx".parse::<ExportFormat>(), Ok(ExportFormat::Docx));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
