//! Documentation loader for ingestion
//!
//! Walks a directory and turns Markdown, plain text and HTML files into
//! [`Document`]s ready for [`docchat_core::VectorStore::add_documents`].

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use scraper::{Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use docchat_core::{Document, Error, Result};

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Markdown,
    Text,
    Html,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::Text),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Html => "html",
        }
    }
}

/// Text and optional title extracted from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub title: Option<String>,
    pub text: String,
}

pub struct DocumentLoader {
    source_label: Option<String>,
    inline_space: Regex,
    blank_lines: Regex,
}

impl DocumentLoader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            source_label: None,
            inline_space: compile(r"[ \t\u{a0}]+")?,
            blank_lines: compile(r"\n\s*\n(\s*\n)*")?,
        })
    }

    /// Use one source label for every document instead of its relative path
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    /// Load every supported file under `root`, sorted by relative path
    pub fn load_directory(&self, root: &Path) -> Result<Vec<Document>> {
        if !root.is_dir() {
            return Err(Error::InvalidInput(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut files = Vec::new();
        collect_files(root, &mut files)?;
        files.sort();

        let mut documents = Vec::new();
        for path in files {
            if let Some(document) = self.load_file(root, &path)? {
                documents.push(document);
            }
        }

        debug!(root = %root.display(), documents = documents.len(), "loaded documentation");
        Ok(documents)
    }

    /// Load a single file; `None` for unsupported or empty files
    pub fn load_file(&self, root: &Path, path: &Path) -> Result<Option<Document>> {
        let Some(format) = DocumentFormat::from_path(path) else {
            return Ok(None);
        };

        let raw = fs::read(path)?;
        let raw = String::from_utf8_lossy(&raw);
        let extracted = self.extract(format, &raw)?;
        if extracted.text.is_empty() {
            warn!(path = %path.display(), "skipping file without text");
            return Ok(None);
        }

        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let title = extracted.title.unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| relative.clone())
        });
        let source = self.source_label.clone().unwrap_or_else(|| relative.clone());

        let document = Document::new(
            format!("{:x}", md5::compute(relative.as_bytes())),
            title,
            source,
            extracted.text,
        )
        .with_metadata("path", relative)
        .with_metadata("format", format.as_str());

        Ok(Some(document))
    }

    pub fn extract(&self, format: DocumentFormat, raw: &str) -> Result<ExtractedText> {
        let extracted = match format {
            DocumentFormat::Markdown => markdown_to_text(raw),
            DocumentFormat::Text => ExtractedText {
                title: None,
                text: raw.to_string(),
            },
            DocumentFormat::Html => html_to_text(raw)?,
        };

        Ok(ExtractedText {
            title: extracted.title.map(|t| self.normalize(&t)).filter(|t| !t.is_empty()),
            text: self.normalize(&extracted.text),
        })
    }

    /// Collapse runs of spaces and blank lines, trim every line
    pub fn normalize(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n");
        let text = self.inline_space.replace_all(&text, " ");
        let trimmed: Vec<&str> = text.lines().map(str::trim).collect();
        let joined = trimmed.join("\n");
        self.blank_lines.replace_all(&joined, "\n\n").trim().to_string()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Configuration(format!("invalid pattern: {}", e)))
}

/// Symlinked directories are skipped so link cycles cannot recurse forever;
/// symlinked files are still loaded.
fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if file_type.is_symlink() && path.is_dir() {
            debug!(path = %path.display(), "skipping symlinked directory");
        } else if DocumentFormat::from_path(&path).is_some() && path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

/// Plain text of a Markdown document; the title is its first heading
pub fn markdown_to_text(markdown: &str) -> ExtractedText {
    let mut text = String::new();
    let mut title: Option<String> = None;
    let mut heading: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { .. }) => heading = Some(String::new()),
            Event::End(TagEnd::Heading(_)) => {
                if let Some(h) = heading.take() {
                    if title.is_none() && !h.trim().is_empty() {
                        title = Some(h.trim().to_string());
                    }
                }
                text.push_str("\n\n");
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some(h) = heading.as_mut() {
                    h.push_str(&t);
                }
                text.push_str(&t);
            }
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::CodeBlock | TagEnd::TableRow) => {
                text.push_str("\n\n")
            }
            Event::End(TagEnd::Item) => text.push('\n'),
            _ => {}
        }
    }

    ExtractedText { title, text }
}

/// Plain text of an HTML page; the title is its `<title>`
pub fn html_to_text(html: &str) -> Result<ExtractedText> {
    let document = Html::parse_document(html);
    let title_selector = selector("title")?;
    let body_selector = selector("body")?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>());

    let mut text = String::new();
    if let Some(body) = document.select(&body_selector).next() {
        for fragment in body.text() {
            let trimmed = fragment.trim();
            if !trimmed.is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(trimmed);
            }
        }
    }

    Ok(ExtractedText { title, text })
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::InvalidInput(format!("invalid selector {}: {}", css, e)))
}
