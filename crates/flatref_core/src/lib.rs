//! Flatref core: pure reference, grouping and planning logic.
mod groups;
mod list;
mod plan;
mod reference;
mod tally;

pub use groups::{normalize_category, CategoryGroup, CategoryGroups};
pub use list::{parse_reference_list, render_reference_list, ParsedList, COMMENT_MARKER};
pub use plan::{plan_downloads, subject_of, DownloadItem, SourceList};
pub use reference::{is_valid_app_id, Reference, ReferenceError, REF_KIND};
pub use tally::{DownloadOutcome, DownloadTally};
