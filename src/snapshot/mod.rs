pub mod summarize;
pub mod types;

pub use summarize::summarize_page;
pub use types::{ElementSummary, MAX_TEXT_CHARS, PageSnapshotCache, position_hint, truncate_text};
