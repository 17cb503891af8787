//! Resolve, download and install a dataset in one pass.

use crate::core::config::Config;
use crate::core::dataset::{DatasetKind, DatasetRequest};
use crate::core::download::{DownloadStatus, Downloader};
use crate::core::http::{HttpClient, ReqwestClient};
use crate::core::layout::{LocalDataset, DATA_DIRS};
use crate::core::resolve::{merge_remote_url, ArchiveKind, RemoteArchive, UrlResolver};
use crate::error::{QdataError, Result};
use crate::utils::fs;
use crate::utils::progress::{ConsoleProgress, Progress};
use crate::utils::prompt::{Prompt, TerminalPrompt};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-call switches for [`DataFetcher::fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Clear the known data directories before extracting.
    pub delete_old: bool,
    /// Do nothing when the target already holds a complete dataset.
    pub exists_skip: bool,
    /// Download even when the archive file is already present.
    pub force_download: bool,
    /// Remove the archive once it has been extracted.
    pub delete_archive: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            delete_old: true,
            exists_skip: false,
            force_download: true,
            delete_archive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The target already held a dataset.
    Skipped { target_dir: PathBuf },
    Completed {
        url: String,
        archive: PathBuf,
        used_latest: bool,
        downloaded: bool,
        extracted: usize,
    },
}

pub struct DataFetcher {
    config: Config,
    client: Box<dyn HttpClient>,
    prompt: Box<dyn Prompt>,
    progress: Box<dyn Progress>,
    today: NaiveDate,
}

impl DataFetcher {
    /// A fetcher talking to the network and the terminal.
    pub fn new(config: Config) -> Result<Self> {
        let client = ReqwestClient::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            config,
            client: Box::new(client),
            prompt: Box::new(TerminalPrompt),
            progress: Box::new(ConsoleProgress::new()),
            today: chrono::Local::now().date_naive(),
        })
    }

    pub fn with_client(mut self, client: Box<dyn HttpClient>) -> Self {
        self.client = client;
        self
    }

    pub fn with_prompt(mut self, prompt: Box<dyn Prompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn downloader(&self) -> Downloader {
        Downloader::new(self.config.chunk_size)
    }

    /// Resolve the archive a request would download, probing the host.
    pub fn resolve(&self, request: &DatasetRequest) -> Result<RemoteArchive> {
        request.validate()?;
        UrlResolver::new(&self.config, self.today).resolve(request, self.client.as_ref())
    }

    pub fn fetch(
        &mut self,
        request: &DatasetRequest,
        options: &FetchOptions,
    ) -> Result<FetchOutcome> {
        request.validate()?;
        let target_dir = fs::expand_home(&request.target_dir)?;

        if options.exists_skip && LocalDataset::new(&target_dir).is_complete()? {
            log::warn!(
                "Data already exists: {}, the data download will be skipped",
                target_dir.display()
            );
            println!(
                "If downloading is required, drop --exists-skip or change the target directory"
            );
            return Ok(FetchOutcome::Skipped { target_dir });
        }

        fs::ensure_dir_exists(&target_dir)?;

        let archive = self.resolve(request)?;
        // Dated releases never change once published.
        let force = if archive.is_latest {
            true
        } else {
            options.force_download && request.kind() != DatasetKind::Release
        };

        let archive_path = target_dir.join(&archive.file_name);
        println!("Fetching {} from {}", request.normalized_name(), archive.url);
        let status = self.downloader().download_file(
            self.client.as_ref(),
            &archive.url,
            &archive_path,
            force,
            self.progress.as_mut(),
        )?;

        let extracted = self.install(&archive_path, &target_dir, options.delete_old)?;

        if options.delete_archive {
            log::info!("Removing {}", archive_path.display());
            fs::remove_file(&archive_path)?;
        }

        Ok(FetchOutcome::Completed {
            url: archive.url,
            archive: archive_path,
            used_latest: archive.is_latest,
            downloaded: matches!(status, DownloadStatus::Downloaded { .. }),
            extracted,
        })
    }

    /// Download a file named relative to the data base URL and install it.
    ///
    /// Names without a directory component are looked up under `v0/`.
    pub fn fetch_file(
        &mut self,
        file_name: &str,
        target_dir: &Path,
        options: &FetchOptions,
    ) -> Result<FetchOutcome> {
        if file_name.is_empty() || file_name.contains("..") {
            return Err(QdataError::invalid_request(format!(
                "invalid file name: '{file_name}'"
            )));
        }

        let target_dir = fs::expand_home(target_dir)?;
        let basename = file_name.rsplit('/').next().unwrap_or(file_name);
        let archive_path = target_dir.join(basename);
        if ArchiveKind::from_path(&archive_path).is_none() {
            return Err(QdataError::UnsupportedArchive { path: archive_path });
        }

        fs::ensure_dir_exists(&target_dir)?;
        let url = merge_remote_url(&self.config.data_url, file_name);

        println!("Fetching {basename} from {url}");
        let status = self.downloader().download_file(
            self.client.as_ref(),
            &url,
            &archive_path,
            options.force_download,
            self.progress.as_mut(),
        )?;

        let extracted = self.install(&archive_path, &target_dir, options.delete_old)?;

        if options.delete_archive {
            fs::remove_file(&archive_path)?;
        }

        Ok(FetchOutcome::Completed {
            url,
            archive: archive_path,
            used_latest: false,
            downloaded: matches!(status, DownloadStatus::Downloaded { .. }),
            extracted,
        })
    }

    /// Optionally clear old data, then extract the archive into `target_dir`.
    pub fn install(
        &mut self,
        archive: &Path,
        target_dir: &Path,
        delete_old: bool,
    ) -> Result<usize> {
        if ArchiveKind::from_path(archive).is_none() {
            return Err(QdataError::UnsupportedArchive {
                path: archive.to_path_buf(),
            });
        }

        if delete_old {
            log::warn!(
                "will delete the old data directories ({}): {}",
                DATA_DIRS.join(", "),
                target_dir.display()
            );
            LocalDataset::new(target_dir).clear(self.prompt.as_ref())?;
        }

        self.downloader()
            .extract_archive(archive, target_dir, self.progress.as_mut())
    }
}
