use std::collections::HashSet;
use std::path::Path;

use crate::Reference;

/// The references read from one list file, tagged with the file's subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceList {
    pub subject: String,
    pub references: Vec<Reference>,
}

/// One descriptor to fetch. `subject` is `None` when output is flat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub app_id: String,
    pub subject: Option<String>,
}

/// File name without its extension, used to namespace output per list.
pub fn subject_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Flattens sources into download items, each app id appearing once across
/// the whole run. An app listed by several sources is attributed to the
/// first. A single source produces flat output.
pub fn plan_downloads(sources: &[SourceList]) -> Vec<DownloadItem> {
    let namespaced = sources.len() > 1;
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for source in sources {
        for reference in &source.references {
            if !seen.insert(reference.app_id().to_string()) {
                continue;
            }
            items.push(DownloadItem {
                app_id: reference.app_id().to_string(),
                subject: namespaced.then(|| source.subject.clone()),
            });
        }
    }
    items
}
