//! Standards catalog abstraction.
//!
//! The engine only reads standards; where they live is a collaborator
//! concern. `FileCatalog` loads a YAML document, `MemoryCatalog` serves a
//! fixed list for tests and embedding callers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::standard::Standard;

#[async_trait]
pub trait StandardsCatalog: Send + Sync {
    /// The raw catalog contents. Eligibility filtering and ordering are the
    /// selector's job, so implementations stay dumb.
    async fn fetch_standards(&self) -> Result<Vec<Standard>>;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    standards: Vec<Standard>,
}

/// Catalog backed by a YAML file of the shape `standards: [...]`.
#[derive(Debug)]
pub struct FileCatalog {
    standards: Vec<Standard>,
}

impl FileCatalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read standards file: {}", path.as_ref().display())
        })?;

        let file: CatalogFile = serde_yaml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse standards file: {}",
                path.as_ref().display()
            )
        })?;

        debug!(
            count = file.standards.len(),
            path = %path.as_ref().display(),
            "Loaded standards catalog"
        );
        Ok(FileCatalog {
            standards: file.standards,
        })
    }
}

#[async_trait]
impl StandardsCatalog for FileCatalog {
    async fn fetch_standards(&self) -> Result<Vec<Standard>> {
        Ok(self.standards.clone())
    }
}

/// In-memory catalog for tests and embedding callers.
pub struct MemoryCatalog {
    standards: Vec<Standard>,
}

impl MemoryCatalog {
    pub fn new(standards: Vec<Standard>) -> Self {
        MemoryCatalog { standards }
    }
}

#[async_trait]
impl StandardsCatalog for MemoryCatalog {
    async fn fetch_standards(&self) -> Result<Vec<Standard>> {
        Ok(self.standards.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_catalog_load() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(
            file,
            r#"
standards:
  - code: "STD-A"
    name: "Standard A"
    status: active
    effective_date: 2025-01-01
  - code: "STD-B"
    name: "Standard B"
    status: draft
    effective_date: 2025-02-01
"#
        )
        .unwrap();

        let catalog = FileCatalog::load(file.path()).expect("Failed to load catalog");
        let standards = catalog.fetch_standards().await.unwrap();
        assert_eq!(standards.len(), 2);
        assert_eq!(standards[0].code, "STD-A");
        assert_eq!(standards[1].code, "STD-B");
    }

    #[test]
    fn test_file_catalog_missing_file() {
        let result = FileCatalog::load("/nonexistent/standards.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read standards file")
        );
    }

    #[test]
    fn test_file_catalog_malformed_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "standards: [ this is not a standard ]").unwrap();

        let result = FileCatalog::load(file.path());
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse standards file")
        );
    }
}
