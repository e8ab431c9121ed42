//! Startup seeding: loading a JSON catalog document into the store.
//!
//! The document nests versions under refbooks and elements under
//! versions. Loading is idempotent, so pointing the service at the
//! same document on every start is safe.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::{RefbookdError, Result};
use crate::persist::SqliteCatalog;

#[derive(Debug, Deserialize)]
pub struct SeedDocument {
    pub refbooks: Vec<SeedRefbook>,
}

#[derive(Debug, Deserialize)]
pub struct SeedRefbook {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub versions: Vec<SeedVersion>,
}

#[derive(Debug, Deserialize)]
pub struct SeedVersion {
    pub version: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub elements: Vec<SeedElement>,
}

#[derive(Debug, Deserialize)]
pub struct SeedElement {
    pub code: String,
    pub value: String,
}

/// Load the seed document at `path` into the catalog.
pub fn load_file(catalog: &SqliteCatalog, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).map_err(|e| {
        RefbookdError::Config(format!("could not read seed file {}: {e}", path.display()))
    })?;
    load_str(catalog, &text)
}

/// Load a seed document given as JSON text into the catalog. Rows that
/// are already present are left untouched.
pub fn load_str(catalog: &SqliteCatalog, json: &str) -> Result<()> {
    let document: SeedDocument = serde_json::from_str(json)
        .map_err(|e| RefbookdError::Config(format!("malformed seed document: {e}")))?;
    let mut versions = 0;
    let mut elements = 0;
    for refbook in &document.refbooks {
        let refbook_id =
            catalog.persist_refbook(&refbook.code, &refbook.name, &refbook.description)?;
        for version in &refbook.versions {
            let version_id =
                catalog.persist_version(refbook_id, &version.version, version.start_date)?;
            versions += 1;
            for element in &version.elements {
                catalog.persist_element(version_id, &element.code, &element.value)?;
                elements += 1;
            }
        }
    }
    info!(
        refbooks = document.refbooks.len(),
        versions, elements, "seed document loaded"
    );
    Ok(())
}
