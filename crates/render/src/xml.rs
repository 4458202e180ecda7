//! Paragraph-level view of WordprocessingML text and in-place rewriting.
//!
//! Word splits a paragraph's text over many runs (`<w:r><w:t>...</w:t></w:r>`)
//! wherever formatting, spell-checking or revision marks change, so a token
//! typed as `[owner]` can arrive as `[`, `own`, `er]`. Tags are therefore
//! searched in the concatenated, unescaped text of each paragraph and the
//! replacement is written back into the runs the tag covered.

use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use std::ops::Range;

const PARAGRAPH: &[u8] = b"w:p";
const TEXT: &[u8] = b"w:t";
const PRESERVE_OPEN: &str = "<w:t xml:space=\"preserve\">";
const LINE_BREAK: &str = "</w:t><w:br/><w:t xml:space=\"preserve\">";

/// What a matched tag is replaced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Replacement {
    /// Plain text, escaped on output; `\n` becomes a line break.
    Text(String),
    /// Markup inserted verbatim inside the `<w:t>` element.
    Raw(String),
}

/// One `<w:t>` element.
#[derive(Debug, Clone)]
struct TextElement {
    open: Range<usize>,
    content: Range<usize>,
}

/// The text of one paragraph and where each piece of it lives in the part.
#[derive(Debug, Clone, Default)]
pub(crate) struct Paragraph {
    elements: Vec<TextElement>,
    bounds: Vec<Range<usize>>,
    pub text: String,
}

/// A byte-range edit against the part's XML source.
#[derive(Debug)]
pub(crate) struct Splice {
    range: Range<usize>,
    markup: String,
}

/// Collects every paragraph holding at least one `<w:t>` element.
///
/// Text boxes nest paragraphs inside paragraphs; each `<w:t>` belongs to its
/// innermost paragraph.
pub(crate) fn paragraphs(xml: &str) -> Result<Vec<Paragraph>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut open_paragraphs: Vec<usize> = Vec::new();
    let mut open_text: Option<Range<usize>> = None;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| format!("{e} (at byte {})", reader.error_position()))?;
        let end = reader.buffer_position() as usize;
        match event {
            Event::Start(e) if e.name().as_ref() == PARAGRAPH => {
                paragraphs.push(Paragraph::default());
                open_paragraphs.push(paragraphs.len() - 1);
            }
            Event::End(e) if e.name().as_ref() == PARAGRAPH => {
                open_paragraphs.pop();
            }
            Event::Start(e) if e.name().as_ref() == TEXT => open_text = Some(start..end),
            Event::End(e) if e.name().as_ref() == TEXT => {
                if let Some(open) = open_text.take()
                    && let Some(&index) = open_paragraphs.last()
                {
                    let content = open.end..start;
                    let text = unescape(&xml[content.clone()]).map_err(|e| e.to_string())?;
                    let paragraph = &mut paragraphs[index];
                    let from = paragraph.text.len();
                    paragraph.text.push_str(&text);
                    paragraph.bounds.push(from..paragraph.text.len());
                    paragraph.elements.push(TextElement { open, content });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    paragraphs.retain(|p| !p.elements.is_empty());
    Ok(paragraphs)
}

impl Paragraph {
    /// Turns tag replacements (byte ranges of [`Self::text`], sorted and
    /// non-overlapping) into splices against the XML source.
    ///
    /// The replacement goes into the element holding the start of the tag;
    /// the rest of the tag is cut from the following elements. Elements no
    /// tag touches are left byte-for-byte as they were.
    pub fn splices(&self, edits: &[(Range<usize>, Replacement)]) -> Vec<Splice> {
        let mut splices = Vec::new();
        for (element, bound) in self.elements.iter().zip(&self.bounds) {
            let mut markup = String::from(PRESERVE_OPEN);
            let mut cursor = bound.start;
            let mut touched = false;
            for (range, replacement) in edits {
                if range.end <= bound.start || range.start >= bound.end {
                    continue;
                }
                touched = true;
                if range.start >= bound.start {
                    push_text(&mut markup, &self.text[cursor..range.start]);
                    match replacement {
                        Replacement::Text(text) => push_text(&mut markup, text),
                        Replacement::Raw(raw) => markup.push_str(raw),
                    }
                }
                cursor = cursor.max(range.end.min(bound.end));
            }
            if !touched {
                continue;
            }
            push_text(&mut markup, &self.text[cursor..bound.end]);
            splices.push(Splice {
                range: element.open.start..element.content.end,
                markup,
            });
        }
        splices
    }
}

fn push_text(out: &mut String, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str(LINE_BREAK);
        }
        out.push_str(&escape(line));
    }
}

/// Applies disjoint splices to `xml`.
///
/// Splices arrive grouped by paragraph, and a text box's paragraph sits in
/// the middle of its enclosing one, so they are put in source order first.
pub(crate) fn apply_splices(xml: &str, mut splices: Vec<Splice>) -> String {
    splices.sort_by_key(|s| s.range.start);
    let mut out = String::with_capacity(xml.len() + splices.iter().map(|s| s.markup.len()).sum::<usize>());
    let mut cursor = 0;
    for splice in splices {
        out.push_str(&xml[cursor..splice.range.start]);
        out.push_str(&splice.markup);
        cursor = splice.range.end;
    }
    out.push_str(&xml[cursor..]);
    out
}

/// Checks that `xml` parses and every element is closed.
pub(crate) fn check_well_formed(xml: &str) -> Result<(), String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("{e} (at byte {})", reader.error_position())),
        }
    }
    if depth > 0 {
        return Err(format!("{depth} element(s) left unclosed"));
    }
    Ok(())
}

/// A tag found in paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag {
    pub range: Range<usize>,
    pub name: String,
}

/// Finds `open name close` tags. An opener without a closer before the next
/// opener (or the end of the paragraph) is returned as the error, truncated
/// for display. Empty tags are skipped and stray closers are plain text.
pub(crate) fn find_tags(text: &str, open: &str, close: &str) -> Result<Vec<Tag>, String> {
    let mut tags = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find(open) {
        let start = cursor + offset;
        let body = start + open.len();
        let rest = &text[body..];
        let close_at = rest.find(close);
        let reopen_at = rest.find(open);
        match close_at {
            Some(c) if reopen_at.is_none_or(|r| r > c) => {
                let end = body + c + close.len();
                let name = rest[..c].trim();
                if !name.is_empty() {
                    tags.push(Tag {
                        range: start..end,
                        name: name.to_string(),
                    });
                }
                cursor = end;
            }
            _ => {
                let partial: String = text[start..].chars().take(40).collect();
                return Err(partial);
            }
        }
    }
    Ok(tags)
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`.
pub(crate) fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}
