//! Immutable in-memory canon document

use crate::version::SemanticVersion;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// One fully-loaded canon document.
///
/// Produced by the loader and never mutated afterwards; ownership passes to
/// the coordinator, which turns it into a published buffer.
#[derive(Debug, Clone, Serialize)]
pub struct CanonDocument {
    /// Version parsed from the header line
    pub version: SemanticVersion,
    /// Full raw content, header line included
    pub content: String,
    /// When this load happened
    pub loaded_at: DateTime<Utc>,
    /// File the content was read from
    pub source_path: PathBuf,
}

impl CanonDocument {
    /// Construct a document from a completed load
    #[inline]
    #[must_use]
    pub fn new(
        version: SemanticVersion,
        content: String,
        loaded_at: DateTime<Utc>,
        source_path: PathBuf,
    ) -> Self {
        Self {
            version,
            content,
            loaded_at,
            source_path,
        }
    }

    /// Render the system prompt derived from this document.
    ///
    /// Prompt assembly proper lives outside this system; the buffer only
    /// carries this deterministic rendering so every pipeline prompt names
    /// the canon version it was built from.
    #[must_use]
    pub fn render_prompt(&self) -> String {
        format!(
            "The canon below is authoritative (version {}). Follow its pipeline \
             stages, document structure, and validation rules exactly.\n\n{}",
            self.version, self.content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> CanonDocument {
        CanonDocument::new(
            SemanticVersion::new(1, 4),
            "PIPELINE_FLOW_VERSION=1.4\n# Overview\n".to_string(),
            Utc::now(),
            PathBuf::from("config/pipeline_flow.md"),
        )
    }

    #[test]
    fn prompt_names_version_and_embeds_content() {
        let d = doc();
        let prompt = d.render_prompt();
        assert!(prompt.contains("version 1.4"));
        assert!(prompt.contains("# Overview"));
    }

    #[test]
    fn document_fields_preserved() {
        let d = doc();
        assert_eq!(d.version, SemanticVersion::new(1, 4));
        assert!(d.content.starts_with("PIPELINE_FLOW_VERSION=1.4"));
    }
}
