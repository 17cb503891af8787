//! Turns a [`DatasetRequest`] into the URL of a remote archive.
//!
//! The versioned URL is probed first. When the host reports 404 the resolver
//! falls back to the `latest` archive of the same dataset.

use crate::core::config::Config;
use crate::core::dataset::{derive_data_version, DatasetKind, DatasetRequest};
use crate::core::http::HttpClient;
use crate::error::Result;
use chrono::NaiveDate;
use std::path::Path;

const LATEST: &str = "latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// A resolved archive, ready to download.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteArchive {
    pub url: String,
    pub kind: ArchiveKind,
    /// Local file name, prefixed with the date or `latest_`.
    pub file_name: String,
    pub is_latest: bool,
}

pub struct UrlResolver<'a> {
    config: &'a Config,
    today: NaiveDate,
}

impl<'a> UrlResolver<'a> {
    pub fn new(config: &'a Config, today: NaiveDate) -> Self {
        Self { config, today }
    }

    fn today_str(&self) -> String {
        self.today.format("%Y-%m-%d").to_string()
    }

    /// Version embedded in the archive URL when no fallback is needed.
    pub fn data_version(&self, request: &DatasetRequest) -> String {
        match request.kind() {
            DatasetKind::Release => self.today_str(),
            DatasetKind::Data => derive_data_version(self.config.tool_version()),
        }
    }

    fn url_for(&self, request: &DatasetRequest, version: &str) -> String {
        let name = request.normalized_name();
        match request.kind() {
            DatasetKind::Release => {
                let base = self.config.bin_url.trim_end_matches('/');
                if version == LATEST {
                    format!("{base}/{LATEST}/download/{name}.tar.gz")
                } else {
                    format!("{base}/download/{version}/{name}.tar.gz")
                }
            }
            DatasetKind::Data => {
                let base = self.config.data_url.trim_end_matches('/');
                let file = format!(
                    "{name}_{}_{}_{version}.zip",
                    request.region.to_lowercase(),
                    request.interval.to_lowercase()
                );
                match request.layout_version() {
                    Some(layout) => format!("{base}/{layout}/{file}"),
                    None => format!("{base}/{file}"),
                }
            }
        }
    }

    fn archive(&self, request: &DatasetRequest, url: String, is_latest: bool) -> RemoteArchive {
        let basename = url.rsplit('/').next().unwrap_or(&url).to_string();
        let prefix = if is_latest {
            LATEST.to_string()
        } else {
            self.today_str()
        };
        let file_name = format!("{prefix}_{basename}");
        let kind = match request.kind() {
            DatasetKind::Release => ArchiveKind::TarGz,
            DatasetKind::Data => ArchiveKind::Zip,
        };

        RemoteArchive {
            url,
            kind,
            file_name,
            is_latest,
        }
    }

    /// The version-specific archive, without probing.
    pub fn versioned(&self, request: &DatasetRequest) -> RemoteArchive {
        let url = self.url_for(request, &self.data_version(request));
        self.archive(request, url, false)
    }

    pub fn latest(&self, request: &DatasetRequest) -> RemoteArchive {
        let url = self.url_for(request, LATEST);
        self.archive(request, url, true)
    }

    /// Probe the versioned archive and fall back to `latest` on 404.
    pub fn resolve(
        &self,
        request: &DatasetRequest,
        client: &dyn HttpClient,
    ) -> Result<RemoteArchive> {
        let versioned = self.versioned(request);
        if is_available(client, &versioned.url)? {
            return Ok(versioned);
        }

        let latest = self.latest(request);
        log::warn!(
            "{} not found, falling back to {}",
            versioned.url,
            latest.url
        );
        Ok(latest)
    }
}

/// Everything except a 404 counts as available.
pub fn is_available(client: &dyn HttpClient, url: &str) -> Result<bool> {
    let response = client.get(url)?;
    log::debug!("probe {url}: {}", response.status);
    Ok(response.status != 404)
}

/// Join a raw file name to a base URL. Names without a directory land under `v0/`.
pub fn merge_remote_url(base_url: &str, file_name: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if file_name.contains('/') {
        format!("{base}/{file_name}")
    } else {
        format!("{base}/v0/{file_name}")
    }
}
