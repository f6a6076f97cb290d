//! Catalog reader: turns the remote AppStream catalog into reference lists.
//!
//! Components are admitted when they support the requested architecture.
//! A component that names no architecture at all is admitted under
//! [`ArchPolicy::IncludeUnspecified`] (the default), on the assumption that
//! a missing restriction means every architecture is supported. That reading
//! of the catalog is not guaranteed, so [`ArchPolicy::RequireExplicit`] is
//! available to drop such components instead.

use std::fmt::Write as _;
use std::path::PathBuf;

use flatref_core::{
    is_valid_app_id, normalize_category, render_reference_list, CategoryGroups, Reference,
};
use flatref_logging::{flatref_debug, flatref_info, flatref_warn};
use thiserror::Error;

use crate::appstream::{open_catalog, CatalogComponent, ComponentReader, DecodeError};
use crate::filename::{list_filename, sanitize_component};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::{Endpoints, FetchError, Fetcher};

pub const DEFAULT_ARCH: &str = "x86_64";
pub const DEFAULT_BRANCH: &str = "stable";
pub const DEFAULT_REFS_DIR: &str = "refs";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog fetch failed for {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("catalog could not be decoded: {0}")]
    Decode(#[from] DecodeError),
    #[error("nothing to do: request category counts, all categories, or at least one category")]
    NothingRequested,
    #[error("invalid reference parameters: {0}")]
    InvalidReference(#[from] flatref_core::ReferenceError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchPolicy {
    #[default]
    IncludeUnspecified,
    RequireExplicit,
}

/// What a dump run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Print category counts; write nothing.
    ReportOnly,
    /// One file per non-empty category.
    All,
    /// The named categories, one file each, or merged into `merge_to`.
    Categories {
        names: Vec<String>,
        merge_to: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOptions {
    pub arch: String,
    pub branch: String,
    pub selection: Selection,
    pub out_dir: PathBuf,
    pub arch_policy: ArchPolicy,
}

impl DumpOptions {
    pub fn new(selection: Selection) -> Self {
        Self {
            arch: DEFAULT_ARCH.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            selection,
            out_dir: PathBuf::from(DEFAULT_REFS_DIR),
            arch_policy: ArchPolicy::default(),
        }
    }

    /// Rejects requests that could never produce output, before any fetch.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Selection::Categories { names, .. } = &self.selection {
            if names.iter().all(|name| normalize_category(name).is_empty()) {
                return Err(CatalogError::NothingRequested);
            }
        }
        // Arch and branch must form valid references.
        Reference::new("org.example.Probe", self.arch.as_str(), self.branch.as_str())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub components: usize,
    pub included: usize,
    pub skipped_malformed: usize,
    pub skipped_arch: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogScan {
    pub groups: CategoryGroups,
    pub stats: ScanStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenList {
    pub path: PathBuf,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpReport {
    Counts(Vec<(String, usize)>),
    Written {
        files: Vec<WrittenList>,
        /// Requested categories the catalog does not contain.
        missing: Vec<String>,
    },
}

/// Groups the components of a catalog document by category.
pub fn scan_catalog(
    bytes: &[u8],
    arch: &str,
    branch: &str,
    policy: ArchPolicy,
) -> Result<CatalogScan, CatalogError> {
    let mut scan = CatalogScan::default();
    for component in ComponentReader::new(open_catalog(bytes)) {
        let component = component?;
        scan.stats.components += 1;
        admit_component(&mut scan, component, arch, branch, policy);
    }
    flatref_info!(
        "Scanned {} components: {} included, {} malformed, {} other architectures",
        scan.stats.components,
        scan.stats.included,
        scan.stats.skipped_malformed,
        scan.stats.skipped_arch
    );
    Ok(scan)
}

fn admit_component(
    scan: &mut CatalogScan,
    component: CatalogComponent,
    arch: &str,
    branch: &str,
    policy: ArchPolicy,
) {
    let app_id = component.id.as_deref().unwrap_or_default();
    if !is_valid_app_id(app_id) {
        flatref_warn!(
            "Skipping catalog component #{} with missing or malformed id {:?}",
            scan.stats.components,
            component.id
        );
        scan.stats.skipped_malformed += 1;
        return;
    }

    let supported = if component.architectures.is_empty() {
        policy == ArchPolicy::IncludeUnspecified
    } else {
        component.architectures.iter().any(|a| a == arch)
    };
    if !supported {
        flatref_debug!(
            "Skipping {} (architectures {:?})",
            app_id,
            component.architectures
        );
        scan.stats.skipped_arch += 1;
        return;
    }

    let reference = match Reference::new(app_id, arch, branch) {
        Ok(reference) => reference,
        Err(err) => {
            flatref_warn!("Skipping catalog component {}: {}", app_id, err);
            scan.stats.skipped_malformed += 1;
            return;
        }
    };
    scan.stats.included += 1;
    for category in &component.categories {
        scan.groups.insert(category, reference.clone());
    }
}

/// Renders the `--dump-categories` table, sorted by category name.
pub fn render_category_counts(counts: &[(String, usize)]) -> String {
    let mut out = String::from("== Category counts ==\n");
    for (category, count) in counts {
        let _ = writeln!(out, "{category:20} {count}");
    }
    let _ = writeln!(out, "{} categories", counts.len());
    out
}

/// Produces the report or the list files for `options` from a finished scan.
pub fn write_report(scan: &CatalogScan, options: &DumpOptions) -> Result<DumpReport, CatalogError> {
    let groups = &scan.groups;
    match &options.selection {
        Selection::ReportOnly => Ok(DumpReport::Counts(
            groups
                .counts()
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
        )),
        Selection::All => {
            ensure_output_dir(&options.out_dir)?;
            let writer = AtomicFileWriter::new(options.out_dir.clone());
            let mut files = Vec::new();
            for (category, group) in groups.iter().filter(|(_, group)| !group.is_empty()) {
                files.push(write_list(
                    &writer,
                    &list_filename(category),
                    group.references(),
                )?);
            }
            Ok(DumpReport::Written {
                files,
                missing: Vec::new(),
            })
        }
        Selection::Categories { names, merge_to } => {
            let requested = dedupe_requested(names);
            let (present, missing): (Vec<&str>, Vec<&str>) = requested
                .iter()
                .map(String::as_str)
                .partition(|name| groups.contains(name));
            if !missing.is_empty() {
                flatref_warn!("No matches for categories: {}", missing.join(", "));
            }

            ensure_output_dir(&options.out_dir)?;
            let writer = AtomicFileWriter::new(options.out_dir.clone());
            let mut files = Vec::new();
            match merge_to {
                Some(merge_name) => {
                    let merged = groups.merged(present.iter().copied());
                    files.push(write_list(&writer, &sanitize_component(merge_name), &merged)?);
                }
                None => {
                    for category in &present {
                        if let Some(group) = groups.get(category) {
                            files.push(write_list(
                                &writer,
                                &list_filename(category),
                                group.references(),
                            )?);
                        }
                    }
                }
            }
            Ok(DumpReport::Written {
                files,
                missing: missing.into_iter().map(str::to_string).collect(),
            })
        }
    }
}

fn dedupe_requested(names: &[String]) -> Vec<String> {
    let mut requested: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let normalized = normalize_category(name);
        if !normalized.is_empty() && !requested.contains(&normalized) {
            requested.push(normalized);
        }
    }
    requested
}

fn write_list(
    writer: &AtomicFileWriter,
    filename: &str,
    references: &[Reference],
) -> Result<WrittenList, CatalogError> {
    let body = render_reference_list(references);
    let path = writer.write(filename, body.as_bytes())?;
    flatref_info!("Wrote {}  ({} refs)", path.display(), references.len());
    Ok(WrittenList {
        path,
        count: references.len(),
    })
}

/// Fetches the catalog through a [`Fetcher`] and runs a dump.
pub struct CatalogReader<'a> {
    fetcher: &'a dyn Fetcher,
    endpoints: &'a Endpoints,
}

impl<'a> CatalogReader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, endpoints: &'a Endpoints) -> Self {
        Self { fetcher, endpoints }
    }

    /// Downloads and scans the whole catalog. Any transport failure is fatal
    /// and reported as [`CatalogError::FetchFailed`].
    pub async fn scan(&self, options: &DumpOptions) -> Result<CatalogScan, CatalogError> {
        let url = self.endpoints.catalog_url(&options.arch);
        flatref_info!("Fetching catalog {}", url);
        let output = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|source| CatalogError::FetchFailed {
                url: url.clone(),
                source,
            })?;
        flatref_debug!(
            "Catalog fetched from {} ({} bytes)",
            output.metadata.final_url,
            output.metadata.byte_len
        );
        scan_catalog(
            &output.bytes,
            &options.arch,
            &options.branch,
            options.arch_policy,
        )
    }

    pub async fn run(&self, options: &DumpOptions) -> Result<DumpReport, CatalogError> {
        options.validate()?;
        let scan = self.scan(options).await?;
        write_report(&scan, options)
    }
}
