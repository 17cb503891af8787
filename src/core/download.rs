use crate::core::http::HttpClient;
use crate::core::resolve::ArchiveKind;
use crate::error::{QdataError, Result};
use crate::utils::fs;
use crate::utils::progress::Progress;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use zip::ZipArchive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// The destination already existed and the download was not forced.
    Skipped,
    Downloaded { bytes: u64 },
}

pub struct Downloader {
    chunk_size: usize,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Downloader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn download_file(
        &self,
        client: &dyn HttpClient,
        url: &str,
        destination: &Path,
        force: bool,
        progress: &mut dyn Progress,
    ) -> Result<DownloadStatus> {
        if destination.exists() && !force {
            log::info!("{} already exists, skipping download", destination.display());
            return Ok(DownloadStatus::Skipped);
        }

        let mut response = client.get(url)?;
        if response.status != 200 {
            return Err(QdataError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        if let Some(parent) = destination.parent() {
            fs::ensure_dir_exists(parent)?;
        }

        let label = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| url.to_string());
        log::info!("{label} downloading from {url}");

        let mut file = File::create(destination)?;
        let mut buffer = vec![0u8; self.chunk_size];
        let mut written = 0u64;

        progress.start(&label, response.content_length.unwrap_or(0));
        loop {
            let read = response.body.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])?;
            written += read as u64;
            progress.advance(read as u64);
        }
        file.flush()?;
        progress.finish();

        log::info!("Downloaded {written} bytes to {}", destination.display());
        Ok(DownloadStatus::Downloaded { bytes: written })
    }

    /// Extract `archive_path` into `destination`, returning the number of members written.
    pub fn extract_archive(
        &self,
        archive_path: &Path,
        destination: &Path,
        progress: &mut dyn Progress,
    ) -> Result<usize> {
        let kind = ArchiveKind::from_path(archive_path).ok_or_else(|| {
            QdataError::UnsupportedArchive {
                path: archive_path.to_path_buf(),
            }
        })?;

        log::info!("{} unzipping......", archive_path.display());
        fs::ensure_dir_exists(destination)?;

        let extracted = match kind {
            ArchiveKind::TarGz => self.extract_tar_gz(archive_path, destination, progress)?,
            ArchiveKind::Zip => self.extract_zip(archive_path, destination, progress)?,
        };

        log::info!("Extracted {extracted} entries into {}", destination.display());
        Ok(extracted)
    }

    /// Unpack with the first path segment of every member removed.
    fn extract_tar_gz(
        &self,
        archive_path: &Path,
        destination: &Path,
        progress: &mut dyn Progress,
    ) -> Result<usize> {
        let file = File::open(archive_path)?;
        let mut archive = Archive::new(GzDecoder::new(file));
        let mut extracted = 0;

        progress.start_items("extracting", 0);
        for entry in archive.entries()? {
            let mut entry = entry?;
            let member = entry.path()?.into_owned();
            progress.advance(1);

            if entry.header().entry_type() == EntryType::Link {
                log::warn!("Skipping hard link member: {}", member.display());
                continue;
            }
            let Some(relative) = strip_first_component(&member) else {
                continue;
            };
            if !is_enclosed(&relative) {
                log::warn!("Skipping archive member outside target: {}", member.display());
                continue;
            }

            let outpath = destination.join(&relative);
            if let Some(parent) = outpath.parent() {
                fs::ensure_dir_exists(parent)?;
            }
            entry.unpack(&outpath)?;
            extracted += 1;
        }
        progress.finish();

        Ok(extracted)
    }

    fn extract_zip(
        &self,
        archive_path: &Path,
        destination: &Path,
        progress: &mut dyn Progress,
    ) -> Result<usize> {
        let file = File::open(archive_path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut extracted = 0;

        progress.start_items("extracting", archive.len() as u64);
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            progress.advance(1);
            let outpath = match file.enclosed_name() {
                Some(path) => destination.join(path),
                None => {
                    log::warn!("Skipping archive member outside target: {}", file.name());
                    continue;
                }
            };

            if file.is_dir() {
                fs::ensure_dir_exists(&outpath)?;
            } else {
                if let Some(p) = outpath.parent() {
                    fs::ensure_dir_exists(p)?;
                }
                let mut outfile = File::create(&outpath)?;
                std::io::copy(&mut file, &mut outfile)?;
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = file.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
                }
            }
            extracted += 1;
        }
        progress.finish();

        Ok(extracted)
    }
}

/// Drop the leading path segment, like `tar --strip-components=1`.
/// Returns `None` when nothing is left.
pub fn strip_first_component(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    components.next()?;
    let rest = components.as_path();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest.to_path_buf())
    }
}

fn is_enclosed(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}


#[cfg(test)]
mod tests {
    use super::testing::{write_tar_gz, write_tar_gz_with_link, write_zip};
    use super::*;
    use crate::core::http::testing::FakeClient;
    use crate::utils::progress::NoProgress;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const URL: &str = "https://host.example/archive.zip";

    #[derive(Default)]
    struct Recorder {
        total: Option<u64>,
        advanced: u64,
    }

    impl Progress for Recorder {
        fn start(&mut self, _label: &str, total: u64) {
            self.total = Some(total);
        }
        fn advance(&mut self, amount: u64) {
            self.advanced += amount;
        }
        fn finish(&mut self) {}
    }

    #[test]
    fn test_download_writes_body_and_reports_progress() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.zip");
        let body = vec![7u8; 5000];
        let client = FakeClient::new().route(URL, 200, &body);
        let mut progress = Recorder::default();

        let status = Downloader::new(1024)
            .download_file(&client, URL, &dest, false, &mut progress)
            .unwrap();

        assert_eq!(status, DownloadStatus::Downloaded { bytes: 5000 });
        assert_eq!(std::fs::read(&dest).unwrap(), body);
        assert_eq!(progress.total, Some(5000));
        assert_eq!(progress.advanced, 5000);
    }

    #[test]
    fn test_download_without_content_length() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.zip");
        let client = FakeClient::new().route_unsized(URL, b"abc");
        let mut progress = Recorder::default();

        Downloader::default()
            .download_file(&client, URL, &dest, true, &mut progress)
            .unwrap();

        assert_eq!(progress.total, Some(0));
        assert_eq!(std::fs::read(&dest).unwrap(), b"abc");
    }

    #[test]
    fn test_existing_file_is_not_downloaded_without_force() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.zip");
        std::fs::write(&dest, b"old").unwrap();
        let client = FakeClient::new().route(URL, 200, b"new");

        let status = Downloader::default()
            .download_file(&client, URL, &dest, false, &mut NoProgress)
            .unwrap();

        assert_eq!(status, DownloadStatus::Skipped);
        assert_eq!(client.request_count(), 0);
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");
    }

    #[test]
    fn test_force_overwrites_existing_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.zip");
        std::fs::write(&dest, b"partial download").unwrap();
        let client = FakeClient::new().route(URL, 200, b"new");

        Downloader::default()
            .download_file(&client, URL, &dest, true, &mut NoProgress)
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_not_found_is_an_error_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.zip");
        let client = FakeClient::new();

        let err = Downloader::default()
            .download_file(&client, URL, &dest, true, &mut NoProgress)
            .unwrap_err();

        assert!(matches!(err, QdataError::HttpStatus { status: 404, .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_non_200_success_status_is_an_error_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out.zip");
        let client = FakeClient::new().route(URL, 204, b"");

        let err = Downloader::default()
            .download_file(&client, URL, &dest, true, &mut NoProgress)
            .unwrap_err();

        assert!(matches!(err, QdataError::HttpStatus { status: 204, .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_tar_gz_skips_hard_links() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("2024-03-05_qlib_bin.tar.gz");
        write_tar_gz_with_link(
            &archive,
            &[("qlib_bin/calendars/day.txt", &b"2024-03-04\n"[..])],
            ("qlib_bin/calendars/copy.txt", "qlib_bin/calendars/day.txt"),
        );
        let target = tmp.path().join("target");

        let count = Downloader::default()
            .extract_archive(&archive, &target, &mut NoProgress)
            .unwrap();

        assert_eq!(count, 1);
        assert!(target.join("calendars/day.txt").is_file());
        assert!(!target.join("calendars/copy.txt").exists());
    }

    #[test]
    fn test_tar_gz_strips_top_level_folder() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("2024-03-05_qlib_bin.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("qlib_bin/calendars/day.txt", b"2024-03-04\n"),
                ("qlib_bin/features/sh600000/close.day.bin", b"\x00\x01"),
            ],
        );
        let target = tmp.path().join("target");

        let count = Downloader::default()
            .extract_archive(&archive, &target, &mut NoProgress)
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(target.join("calendars/day.txt")).unwrap(),
            "2024-03-04\n"
        );
        assert!(target.join("features/sh600000/close.day.bin").is_file());
        assert!(!target.join("qlib_bin").exists());
    }

    #[test]
    fn test_zip_preserves_member_paths() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("latest_qlib_data_cn_1d_latest.zip");
        write_zip(
            &archive,
            &[
                ("calendars/day.txt", b"2024-03-04\n"),
                ("instruments/all.txt", b"SH600000\t2020-01-01\t2024-03-04\n"),
            ],
        );
        let target = tmp.path().join("target");
        let mut progress = Recorder::default();

        Downloader::default()
            .extract_archive(&archive, &target, &mut progress)
            .unwrap();

        assert!(target.join("calendars/day.txt").is_file());
        assert!(target.join("instruments/all.txt").is_file());
        assert_eq!(progress.total, Some(2));
    }

    #[test]
    fn test_unsupported_suffix_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("data.rar");
        std::fs::write(&archive, b"rar").unwrap();
        let target = tmp.path().join("target");

        let err = Downloader::default()
            .extract_archive(&archive, &target, &mut NoProgress)
            .unwrap_err();

        assert!(matches!(err, QdataError::UnsupportedArchive { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_strip_first_component() {
        assert_eq!(
            strip_first_component(Path::new("top/a/b.txt")),
            Some(PathBuf::from("a/b.txt"))
        );
        assert_eq!(strip_first_component(Path::new("top")), None);
        assert_eq!(strip_first_component(Path::new("top/")), None);
        assert_eq!(
            strip_first_component(Path::new("./top/a")),
            Some(PathBuf::from("top/a"))
        );
    }

    #[test]
    fn test_is_enclosed() {
        assert!(is_enclosed(Path::new("a/b")));
        assert!(!is_enclosed(Path::new("../a")));
        assert!(!is_enclosed(Path::new("/etc/passwd")));
    }
}
