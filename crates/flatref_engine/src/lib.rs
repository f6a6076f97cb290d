//! Flatref engine: catalog fetching, list persistence and descriptor downloads.
mod appstream;
mod catalog;
mod download;
mod endpoints;
mod fetch;
mod filename;
mod persist;
mod types;

pub use appstream::{open_catalog, CatalogComponent, ComponentReader, DecodeError};
pub use catalog::{
    render_category_counts, scan_catalog, write_report, ArchPolicy, CatalogError, CatalogReader,
    CatalogScan, DumpOptions, DumpReport, ScanStats, Selection, WrittenList, DEFAULT_ARCH,
    DEFAULT_BRANCH, DEFAULT_REFS_DIR,
};
pub use download::{
    find_lists_in_dir, load_sources, resolve_inputs, DownloadError, DownloadOptions,
    DownloadReport, Downloader, DEFAULT_DESCRIPTOR_DIR,
};
pub use endpoints::{default_user_agent, EndpointError, Endpoints};
pub use fetch::{
    FetchSettings, Fetcher, LogProgressSink, NullProgressSink, ProgressSink, ReqwestFetcher,
    CATALOG_MAX_BYTES, DESCRIPTOR_MAX_BYTES,
};
pub use filename::{
    descriptor_filename, list_filename, sanitize_component, DESCRIPTOR_EXTENSION, REFS_EXTENSION,
};
pub use persist::{ensure_output_dir, is_present, AtomicFileWriter, PersistError};
pub use types::{DownloadEvent, FailedAttempt, FailureKind, FetchError, FetchMetadata, FetchOutput};
