//! Structural validation of canon content
//!
//! A canon document must carry a fixed catalog of sections. Headings are
//! matched case-insensitively, at levels 1-3, with an optional leading
//! ordinal (`3.` or `3.1`). Validation collects *all* missing sections and
//! reports them together so an author fixes the document in one pass.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;

/// Sections every canon document must contain, in conventional order
pub const REQUIRED_SECTIONS: [&str; 6] = [
    "Overview",
    "Pipeline Stages",
    "Document Structure",
    "Prompt Templates",
    "Validation Rules",
    "Glossary",
];

/// Deepest heading level considered a section heading
pub const MAX_SECTION_LEVEL: u8 = 3;

// Leading ordinal like "3. " or "3.1 " before a section title
static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*\.?\s+").expect("valid ordinal pattern"));

/// One heading found in canon content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading level (1-6)
    pub level: u8,
    /// Raw title text
    pub title: String,
}

/// Collect all headings from markdown content.
///
/// Text inside a heading may arrive as multiple events (inline code,
/// emphasis); fragments are concatenated into one title.
#[must_use]
pub fn scan_headings(content: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Heading {
                    level: level as u8,
                    title: String::new(),
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(ref mut heading) = current {
                    heading.title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}

/// Normalize a heading title for catalog comparison: strip any leading
/// ordinal, trim, lowercase.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    ORDINAL.replace(title.trim(), "").trim().to_lowercase()
}

/// Required sections absent from the given content.
///
/// Returns the missing names in catalog order; empty means the document is
/// structurally complete. Headings deeper than level 3 do not count as
/// sections.
#[must_use]
pub fn missing_sections(content: &str) -> Vec<String> {
    let present: Vec<String> = scan_headings(content)
        .into_iter()
        .filter(|h| h.level <= MAX_SECTION_LEVEL)
        .map(|h| normalize_title(&h.title))
        .collect();

    REQUIRED_SECTIONS
        .iter()
        .filter(|name| !present.iter().any(|p| p == &name.to_lowercase()))
        .map(|name| (*name).to_string())
        .collect()
}
