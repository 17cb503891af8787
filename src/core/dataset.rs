use crate::core::config::DEFAULT_TARGET_DIR;
use crate::error::{QdataError, Result};
use std::path::PathBuf;

/// Dataset name served as dated tar.gz releases.
pub const RELEASE_DATASET: &str = "qlib_bin";

/// Layout version used when a request does not name one.
pub const DEFAULT_LAYOUT_VERSION: &str = "v2";

/// Layout version value selecting archives stored directly under the base URL.
pub const UNVERSIONED: &str = "none";

/// The two families of remote archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// `<bin_base>/download/<YYYY-MM-DD>/<name>.tar.gz`
    Release,
    /// `<data_base>/<layout>/<name>_<region>_<interval>_<version>.zip`
    Data,
}

/// Everything needed to resolve and install one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRequest {
    pub name: String,
    /// Layout version such as `v1` or `v2`, `none` for unversioned paths.
    pub version: Option<String>,
    pub interval: String,
    pub region: String,
    pub target_dir: PathBuf,
}

impl Default for DatasetRequest {
    fn default() -> Self {
        DatasetRequest {
            name: "qlib_data".to_string(),
            version: None,
            interval: "1d".to_string(),
            region: "cn".to_string(),
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
        }
    }
}

impl DatasetRequest {
    pub fn new<S: Into<String>>(name: S, target_dir: impl Into<PathBuf>) -> Self {
        DatasetRequest {
            name: name.into(),
            target_dir: target_dir.into(),
            ..Self::default()
        }
    }

    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn kind(&self) -> DatasetKind {
        if self.normalized_name() == RELEASE_DATASET {
            DatasetKind::Release
        } else {
            DatasetKind::Data
        }
    }

    /// Directory segment for data archives, `None` when unversioned.
    pub fn layout_version(&self) -> Option<&str> {
        match self.version.as_deref() {
            None => Some(DEFAULT_LAYOUT_VERSION),
            Some(v) if v.eq_ignore_ascii_case(UNVERSIONED) => None,
            Some(v) => Some(v),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("name", self.name.as_str()),
            ("interval", self.interval.as_str()),
            ("region", self.region.as_str()),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(QdataError::invalid_request(format!("{field} must not be empty")));
            }
            if value.contains(['/', '\\']) || value.contains("..") {
                return Err(QdataError::invalid_request(format!(
                    "{field} contains path characters: '{value}'"
                )));
            }
        }

        if let Some(layout) = self.layout_version() {
            if layout.is_empty() || layout.contains(['/', '\\']) || layout.contains("..") {
                return Err(QdataError::invalid_request(format!(
                    "invalid dataset version: '{layout}'"
                )));
            }
        }

        Ok(())
    }
}

/// Data archive version derived from a tool version: every numeric run that is
/// followed by a dot, joined with dots. `0.9.6` becomes `0.9`.
pub fn derive_data_version(tool_version: &str) -> String {
    let mut parts = Vec::new();
    let mut digits = String::new();

    for c in tool_version.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if c == '.' && !digits.is_empty() {
            parts.push(std::mem::take(&mut digits));
        }
        digits.clear();
    }

    parts.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_derive_data_version() {
        assert_eq!(derive_data_version("0.9.6"), "0.9");
        assert_eq!(derive_data_version("0.9.6.99"), "0.9.6");
        assert_eq!(derive_data_version("10.2"), "10");
        assert_eq!(derive_data_version("1.0.0rc1"), "1.0");
        assert_eq!(derive_data_version("1..2"), "1");
        assert_eq!(derive_data_version("7"), "");
    }

    #[test]
    fn test_kind_is_case_insensitive() {
        assert_eq!(DatasetRequest::new("QLIB_BIN", "/tmp/x").kind(), DatasetKind::Release);
        assert_eq!(DatasetRequest::new("qlib_data", "/tmp/x").kind(), DatasetKind::Data);
        assert_eq!(
            DatasetRequest::new("qlib_data_simple", "/tmp/x").kind(),
            DatasetKind::Data
        );
    }

    #[test]
    fn test_layout_version() {
        let mut request = DatasetRequest::default();
        assert_eq!(request.layout_version(), Some("v2"));

        request.version = Some("v1".to_string());
        assert_eq!(request.layout_version(), Some("v1"));

        request.version = Some("None".to_string());
        assert_eq!(request.layout_version(), None);
    }

    #[test]
    fn test_validate_rejects_path_segments() {
        let mut request = DatasetRequest::default();
        assert!(request.validate().is_ok());

        request.region = "../cn".to_string();
        assert!(matches!(
            request.validate(),
            Err(QdataError::InvalidRequest { .. })
        ));

        let mut request = DatasetRequest::default();
        request.version = Some("v2/extra".to_string());
        assert!(request.validate().is_err());

        let mut request = DatasetRequest::default();
        request.interval.clear();
        assert!(request.validate().is_err());
    }
}
