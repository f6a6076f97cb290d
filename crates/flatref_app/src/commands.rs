use std::time::Duration;

use anyhow::{Context, Result};
use flatref_engine::{
    render_category_counts, CatalogError, CatalogReader, DownloadError, Downloader, DumpReport,
    EndpointError, Endpoints, FetchSettings, LogProgressSink, ReqwestFetcher,
};
use flatref_logging::{flatref_info, flatref_warn};

use crate::cli::{Cli, Command, DownloadArgs, DumpArgs};
use crate::config::{self, ConfigError};

const EXIT_FATAL: u8 = 1;
const EXIT_USAGE: u8 = 2;

pub fn run(cli: Cli) -> Result<()> {
    let endpoints = config::load_endpoints(cli.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    match cli.command {
        Command::Dump(args) => runtime.block_on(dump(&args, endpoints)),
        Command::Download(args) => runtime.block_on(download(&args, endpoints)),
    }
}

/// Input and configuration problems exit with 2, everything else with 1.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<EndpointError>().is_some()
    {
        return EXIT_USAGE;
    }
    match err.downcast_ref::<CatalogError>() {
        Some(CatalogError::NothingRequested | CatalogError::InvalidReference(_)) => {
            return EXIT_USAGE
        }
        Some(_) => return EXIT_FATAL,
        None => {}
    }
    match err.downcast_ref::<DownloadError>() {
        Some(DownloadError::InputMissing(_) | DownloadError::NoInputs) => EXIT_USAGE,
        _ => EXIT_FATAL,
    }
}

async fn dump(args: &DumpArgs, mut endpoints: Endpoints) -> Result<()> {
    if let Some(url) = &args.catalog_url {
        endpoints.catalog = url.clone();
        endpoints.validate()?;
    }
    let options = args.to_options();
    let fetcher = ReqwestFetcher::new(FetchSettings {
        user_agent: endpoints.user_agent.clone(),
        ..FetchSettings::for_catalog()
    })?;

    match CatalogReader::new(&fetcher, &endpoints).run(&options).await? {
        DumpReport::Counts(counts) => print!("{}", render_category_counts(&counts)),
        DumpReport::Written { files, missing } => {
            let refs: usize = files.iter().map(|file| file.count).sum();
            flatref_info!(
                "Wrote {} files with {} refs to {}",
                files.len(),
                refs,
                options.out_dir.display()
            );
            if files.is_empty() && !missing.is_empty() {
                flatref_warn!("None of the requested categories exist in the catalog");
            }
        }
    }
    Ok(())
}

async fn download(args: &DownloadArgs, endpoints: Endpoints) -> Result<()> {
    let options = args.to_options();
    let fetcher = ReqwestFetcher::new(FetchSettings {
        request_timeout: Duration::from_secs(args.timeout),
        user_agent: endpoints.user_agent.clone(),
        ..FetchSettings::default()
    })?;

    let report = Downloader::new(&fetcher, &endpoints, &LogProgressSink)
        .run(&options)
        .await?;
    println!("\n{}", report.tally);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn input_problems_exit_with_usage_code() {
        let err = anyhow::Error::new(DownloadError::InputMissing(PathBuf::from("a.refs")));
        assert_eq!(exit_code_for(&err), EXIT_USAGE);
        let err = anyhow::Error::new(CatalogError::NothingRequested);
        assert_eq!(exit_code_for(&err), EXIT_USAGE);
    }

    #[test]
    fn runtime_problems_exit_with_fatal_code() {
        let err = anyhow::Error::new(CatalogError::FetchFailed {
            url: "https://example.org/appstream.xml.gz".into(),
            source: flatref_engine::FetchError {
                kind: flatref_engine::FailureKind::Network,
                message: "connection refused".into(),
            },
        });
        assert_eq!(exit_code_for(&err), EXIT_FATAL);
        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), EXIT_FATAL);
    }
}
