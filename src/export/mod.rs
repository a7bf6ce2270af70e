//! Transcript export
//!
//! [`TranscriptExporter`] turns an ordered message sequence into paginated
//! pages of placed lines, then renders those pages as a PDF document or as
//! plain text. Layout is pure; only [`TranscriptExporter::export_to_file`]
//! touches the filesystem.

pub mod pdf;

use std::path::Path;

use crate::config::{ExportConfig, ExportFormat, PageBreak};
use crate::error::{MdChatError, Result};
use crate::session::Message;

/// What a placed line is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Document title at the top of the first page
    Title,
    /// Part of a message
    Body,
}

/// A line of text at a position on a page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Horizontal position in layout units
    pub x: f32,
    /// Vertical position in layout units, growing downward
    pub y: f32,
    /// Text of the line
    pub text: String,
    /// Title or body
    pub kind: LineKind,
}

/// One page of laid-out lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Lines in placement order
    pub lines: Vec<PlacedLine>,
}

impl Page {
    /// Whether nothing was placed on the page
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Lays out and renders chat transcripts
#[derive(Debug, Clone)]
pub struct TranscriptExporter {
    config: ExportConfig,
}

impl TranscriptExporter {
    /// Create an exporter
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Export settings in use
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Lay out messages into pages
    ///
    /// The title goes at the top margin of the first page. Each message is
    /// prefixed with its speaker label, word-wrapped to the text width, and
    /// placed one line per line height. When the cursor passes the height
    /// budget a new page is started, either before the next line
    /// ([`PageBreak::PerLine`]) or after the whole message
    /// ([`PageBreak::PerMessage`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use mdchat::config::ExportConfig;
    /// use mdchat::export::{LineKind, TranscriptExporter};
    ///
    /// let pages = TranscriptExporter::new(ExportConfig::default()).layout(&[]);
    /// assert_eq!(pages.len(), 1);
    /// assert_eq!(pages[0].lines.len(), 1);
    /// assert_eq!(pages[0].lines[0].kind, LineKind::Title);
    /// ```
    pub fn layout(&self, messages: &[Message]) -> Vec<Page> {
        let g = &self.config.geometry;
        let mut pages = vec![Page::default()];
        let mut y = g.top_margin;

        pages[0].lines.push(PlacedLine {
            x: g.left_margin,
            y,
            text: self.config.title.clone(),
            kind: LineKind::Title,
        });
        y += g.header_height;

        for message in messages {
            let text = format!("{}: {}", message.role.label(), message.content);
            for line in wrap_text(&text, g.text_width, g.char_width) {
                if self.config.page_break == PageBreak::PerLine && y > g.height_budget {
                    pages.push(Page::default());
                    y = g.top_margin;
                }
                if let Some(page) = pages.last_mut() {
                    page.lines.push(PlacedLine {
                        x: g.left_margin,
                        y,
                        text: line,
                        kind: LineKind::Body,
                    });
                }
                y += g.line_height;
            }

            if self.config.page_break == PageBreak::PerMessage && y > g.height_budget {
                pages.push(Page::default());
                y = g.top_margin;
            }
        }

        pages
    }

    /// Render laid-out pages in `format`
    pub fn render(&self, pages: &[Page], format: ExportFormat) -> Vec<u8> {
        match format {
            ExportFormat::Pdf => pdf::render_pdf(pages, &self.config),
            ExportFormat::Text => render_text(pages).into_bytes(),
        }
    }

    /// Lay out, render, and write a transcript to `path`
    ///
    /// # Errors
    ///
    /// Returns [`MdChatError::Export`] if the file cannot be written
    pub fn export_to_file(
        &self,
        messages: &[Message],
        path: &Path,
        format: ExportFormat,
    ) -> Result<usize> {
        let pages = self.layout(messages);
        let bytes = self.render(&pages, format);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                MdChatError::Export(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        std::fs::write(path, &bytes).map_err(|e| {
            MdChatError::Export(format!("Failed to write {}: {}", path.display(), e))
        })?;

        tracing::info!(
            "Exported {} messages to {} ({} pages)",
            messages.len(),
            path.display(),
            pages.len()
        );
        Ok(pages.len())
    }
}

/// Word-wrap `text` to lines no wider than `width`
///
/// Width is measured as characters times `char_width`. Paragraphs are split
/// on `\n` and an empty paragraph yields an empty line. Words wider than a
/// whole line are split at the line width.
///
/// # Examples
///
/// ```
/// use mdchat::export::wrap_text;
///
/// assert_eq!(wrap_text("aaa bbb ccc", 21.0, 3.0), vec!["aaa bbb", "ccc"]);
/// ```
pub fn wrap_text(text: &str, width: f32, char_width: f32) -> Vec<String> {
    let max_chars = ((width / char_width).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();

            if current_len > 0 && current_len + 1 + word_len <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
                continue;
            }

            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(max_chars).peekable();
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() {
                    lines.push(chunk.iter().collect());
                } else {
                    current = chunk.iter().collect();
                    current_len = chunk.len();
                }
            }
        }

        lines.push(current);
    }

    lines
}

/// Render pages as plain text, one line per placed line, pages separated
/// by a form feed
pub fn render_text(pages: &[Page]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push('\u{c}');
            out.push('\n');
        }
        for line in &page.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
    }
    out
}
