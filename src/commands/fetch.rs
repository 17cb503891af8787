use crate::core::config::Config;
use crate::core::dataset::DatasetRequest;
use crate::core::fetcher::{DataFetcher, FetchOptions, FetchOutcome};
use crate::error::Result;
use std::path::Path;

pub fn fetch_dataset(
    config: Config,
    request: &DatasetRequest,
    options: &FetchOptions,
) -> Result<()> {
    let mut fetcher = DataFetcher::new(config)?;

    println!("Fetching dataset: {}", request.normalized_name());
    let outcome = fetcher.fetch(request, options)?;
    report(&outcome);

    Ok(())
}

pub fn fetch_file(
    config: Config,
    file_name: &str,
    target_dir: &Path,
    options: &FetchOptions,
) -> Result<()> {
    let mut fetcher = DataFetcher::new(config)?;

    let outcome = fetcher.fetch_file(file_name, target_dir, options)?;
    report(&outcome);

    Ok(())
}

fn report(outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Skipped { target_dir } => {
            println!("Data already present in {}", target_dir.display());
        }
        FetchOutcome::Completed {
            url,
            archive,
            used_latest,
            downloaded,
            extracted,
        } => {
            if *used_latest {
                println!("Requested version not published, used latest archive instead");
            }
            if !*downloaded {
                println!("Reused existing archive {}", archive.display());
            }
            println!("✅ Installed {extracted} entries from {url}");
            if archive.exists() {
                println!("   Archive kept at {}", archive.display());
            }
        }
    }
}
