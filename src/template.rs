//! The template shell: the bootstrap HTML the SPA is served from.
//!
//! Before crawling, every element in the template's `<head>` is tagged with
//! [`PROVENANCE_ATTR`] so that head content present in the template can later
//! be told apart from head content the running app injects.

use crate::dom::{parse_selector, Document};
use crate::Result;

/// Attribute marking `<head>` children that come from the template file.
pub const PROVENANCE_ATTR: &str = "data-prerender-source";

/// Value of [`PROVENANCE_ATTR`] on template markup.
pub const PROVENANCE_VALUE: &str = "template";

pub(crate) const HEAD_CHILDREN: &str = "head > *";

/// Original and provenance-tagged template content.
#[derive(Debug, Clone)]
pub struct Template {
    original: String,
    tagged: String,
}

impl Template {
    /// Capture `original` and derive the tagged variant.
    pub fn capture(original: impl Into<String>) -> Result<Self> {
        let original = original.into();
        let tagged = tag_head(&original)?;
        Ok(Self { original, tagged })
    }

    /// Template content as read from disk.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Template content with every head child tagged.
    pub fn tagged(&self) -> &str {
        &self.tagged
    }

    /// Content to persist as the template file once crawling is done: the
    /// rendered seed page when there is one, the original content otherwise.
    pub fn finalize(self, rendered_seed: Option<String>) -> String {
        rendered_seed.unwrap_or(self.original)
    }
}

fn tag_head(content: &str) -> Result<String> {
    let selector = parse_selector(HEAD_CHILDREN)?;
    let mut doc = Document::parse(content);
    for id in doc.select_ids(&selector) {
        doc.set_attr(id, PROVENANCE_ATTR, PROVENANCE_VALUE);
    }
    Ok(doc.html())
}
