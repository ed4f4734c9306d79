//! Context assembly
//!
//! Information Hiding:
//! - Tag -> provider method mapping internal to the aggregator
//! - Fragment wording kept in `labels`, payload reading in `render`
//! - Callers get ordered fragments or one text block, never an error

pub mod aggregator;
pub mod composer;
pub mod labels;
pub mod render;

pub use aggregator::ContextAggregator;
pub use composer::{compose, SessionContext};
pub use labels::Labels;
pub use render::FragmentRenderer;

use crate::intent::IntentTag;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// Rendered from a successful provider answer.
    Data,
    /// Provider answered with an error or without the expected fields.
    NoData,
    /// Transport failure, timeout or malformed response.
    Unavailable,
    /// Balance asked for by an anonymous user.
    Anonymous,
}

/// One line (or short block) of provider-sourced context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextFragment {
    /// `None` for the dashboard fallback.
    pub tag: Option<IntentTag>,
    pub kind: FragmentKind,
    pub text: String,
}

impl ContextFragment {
    pub fn data(tag: Option<IntentTag>, text: String) -> Self {
        Self {
            tag,
            kind: FragmentKind::Data,
            text,
        }
    }

    pub fn failed(tag: Option<IntentTag>, kind: FragmentKind, text: &str) -> Self {
        Self {
            tag,
            kind,
            text: text.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.kind, FragmentKind::NoData | FragmentKind::Unavailable)
    }
}

/// Join fragment texts in order, one per line.
pub fn render_fragments(fragments: &[ContextFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
