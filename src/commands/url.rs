use crate::core::config::Config;
use crate::core::dataset::DatasetRequest;
use crate::core::fetcher::DataFetcher;
use crate::error::Result;

/// Print the archive a fetch would download, without downloading it.
pub fn show_url(config: Config, request: &DatasetRequest) -> Result<()> {
    let fetcher = DataFetcher::new(config)?;

    let archive = fetcher.resolve(request)?;
    println!("{}", archive.url);
    if archive.is_latest {
        println!("(versioned archive not found, using latest)");
    }
    println!("Saved as: {}", archive.file_name);

    Ok(())
}
