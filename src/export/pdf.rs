//! Minimal PDF 1.4 writer
//!
//! Produces one PDF page per layout [`Page`], drawing every placed line with
//! the standard Helvetica font. Layout units are millimetres measured from
//! the top-left corner; PDF user space is points measured from the
//! bottom-left, so coordinates are scaled and the y axis is flipped.

use std::fmt::Write as _;

use super::Page;
use crate::config::ExportConfig;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_ID: usize = 3;
const FIRST_PAGE_ID: usize = 4;

/// Render pages as a PDF document
///
/// # Examples
///
/// ```
/// use mdchat::config::ExportConfig;
/// use mdchat::export::{pdf, TranscriptExporter};
///
/// let config = ExportConfig::default();
/// let pages = TranscriptExporter::new(config.clone()).layout(&[]);
/// let bytes = pdf::render_pdf(&pages, &config);
/// assert!(bytes.starts_with(b"%PDF-1.4"));
/// assert!(bytes.ends_with(b"%%EOF\n"));
/// ```
pub fn render_pdf(pages: &[Page], config: &ExportConfig) -> Vec<u8> {
    let g = &config.geometry;
    let width = g.page_width * POINTS_PER_MM;
    let height = g.page_height * POINTS_PER_MM;

    let mut writer = PdfWriter::new();

    writer.object(
        CATALOG_ID,
        format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID).as_bytes(),
    );

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", page_object_id(i)))
        .collect();
    writer.object(
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );

    writer.object(
        FONT_ID,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );

    for (i, page) in pages.iter().enumerate() {
        let page_id = page_object_id(i);
        let content_id = page_id + 1;

        writer.object(
            page_id,
            format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
                PAGES_ID, width, height, FONT_ID, content_id
            )
            .as_bytes(),
        );

        let stream = content_stream(page, config);
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        writer.object(content_id, &body);
    }

    writer.finish(CATALOG_ID)
}

fn page_object_id(index: usize) -> usize {
    FIRST_PAGE_ID + index * 2
}

fn content_stream(page: &Page, config: &ExportConfig) -> Vec<u8> {
    let g = &config.geometry;
    let mut out = String::new();

    for line in &page.lines {
        let x = line.x * POINTS_PER_MM;
        let y = (g.page_height - line.y) * POINTS_PER_MM;
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "BT /F1 {:.1} Tf {:.2} {:.2} Td ({}) Tj ET",
            config.font_size,
            x,
            y,
            escape_text(&line.text)
        );
    }

    out.into_bytes()
}

/// Escape a string for a PDF literal string in WinAnsi encoding
///
/// Characters with a WinAnsi code above ASCII (Latin-1 plus the
/// typographic punctuation at 0x80..0x9F) are written as octal escapes.
/// Standard Helvetica has no glyphs beyond WinAnsi, so anything else
/// (emoji, symbols such as U+26A0, non-Latin scripts) becomes `?`.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            '\t' => out.push(' '),
            ' '..='~' => out.push(c),
            _ => match winansi_byte(c) {
                Some(byte) => {
                    let _ = write!(out, "\\{:03o}", byte);
                }
                None => out.push('?'),
            },
        }
    }
    out
}

/// WinAnsi code for a non-ASCII character, if it has one
fn winansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\u{a0}'..='\u{ff}' => c as u8,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => return None,
    };
    Some(byte)
}

/// Accumulates numbered objects and tracks their byte offsets for the
/// cross-reference table
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        self.offsets.sort_by_key(|(id, _)| *id);
        let size = self.offsets.len() + 1;
        let xref_offset = self.buf.len();

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for (_, offset) in &self.offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, root, xref_offset
        );

        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}
