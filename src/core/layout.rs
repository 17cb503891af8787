//! Knowledge of what an extracted dataset directory looks like.

use crate::error::{QdataError, Result};
use crate::utils::fs;
use crate::utils::prompt::Prompt;
use std::collections::HashSet;
use std::path::PathBuf;

/// Subdirectories owned by an installed dataset, removed before re-extraction.
pub const DATA_DIRS: [&str; 5] = [
    "features",
    "calendars",
    "instruments",
    "features_cache",
    "dataset_cache",
];

const INSTRUMENT_PREFIX: &str = "_qlib_";

pub struct LocalDataset {
    root: PathBuf,
}

impl LocalDataset {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The known data directories currently present under the root.
    pub fn existing_data_dirs(&self) -> Vec<PathBuf> {
        DATA_DIRS
            .iter()
            .map(|name| self.root.join(name))
            .filter(|path| path.exists())
            .collect()
    }

    /// Remove the existing data directories after the operator agrees.
    ///
    /// Returns the removed directories. Nothing is asked when none exist.
    pub fn clear(&self, prompt: &dyn Prompt) -> Result<Vec<PathBuf>> {
        let existing = self.existing_data_dirs();
        if existing.is_empty() {
            return Ok(existing);
        }

        let listing = existing
            .iter()
            .map(|p| format!("\t{}", p.display()))
            .collect::<Vec<_>>()
            .join("\n");
        println!("Will be deleted:\n{listing}");
        println!(
            "If you do not need to delete {}, please choose another target directory",
            self.root.display()
        );

        if !prompt.confirm("Are you sure you want to delete these directories?")? {
            return Err(QdataError::DeletionDeclined {
                dir: self.root.clone(),
            });
        }

        for dir in &existing {
            log::warn!("delete: {}", dir.display());
            fs::remove_dir_recursive(dir)?;
        }

        Ok(existing)
    }

    /// Whether the root holds a complete dataset: populated calendar,
    /// instrument and feature directories, a feature file for every calendar
    /// frequency, and a feature directory for every listed instrument.
    pub fn is_complete(&self) -> Result<bool> {
        if !self.root.exists() {
            return Ok(false);
        }

        let calendars = self.root.join("calendars");
        let instruments = self.root.join("instruments");
        let features = self.root.join("features");

        for dir in [&calendars, &instruments, &features] {
            if !fs::is_non_empty_dir(dir) {
                return Ok(false);
            }
        }

        for entry in std::fs::read_dir(&calendars)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if name.contains("_future") {
                continue;
            }
            let freq = name.split('.').next().unwrap_or_default();
            let suffix = format!(".{freq}.bin");
            if !fs::any_file_matches(&features, &|n: &str| n.ends_with(&suffix))? {
                log::debug!("no {suffix} feature files for calendar {name}");
                return Ok(false);
            }
        }

        let codes: HashSet<String> = std::fs::read_dir(&features)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_lowercase())
            .map(|name| match name.strip_prefix(INSTRUMENT_PREFIX) {
                Some(code) => code.to_string(),
                None => name,
            })
            .collect();

        let all = instruments.join("all.txt");
        if !all.exists() {
            return Ok(false);
        }
        let missing: Vec<String> = std::fs::read_to_string(&all)?
            .lines()
            .filter_map(|line| line.split('\t').next())
            .map(|code| code.trim().to_lowercase())
            .filter(|code| !code.is_empty() && !codes.contains(code))
            .collect();

        if missing.iter().any(|code| !code.contains("sht")) {
            log::debug!("instruments without features: {missing:?}");
            return Ok(false);
        }

        Ok(true)
    }
}
