//! Schema and seed scripts
//!
//! Both scripts are opaque multi-statement SQL supplied by the deployment.
//! They are read once when the catalog is built and never change afterwards.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::ScriptPaths;
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone)]
pub struct Scripts {
    schema: Arc<str>,
    seed: Arc<str>,
}

impl Scripts {
    pub fn new(schema: impl Into<Arc<str>>, seed: impl Into<Arc<str>>) -> Self {
        Self {
            schema: schema.into(),
            seed: seed.into(),
        }
    }

    /// Read both scripts from disk.
    pub fn load(paths: &ScriptPaths) -> Result<Self> {
        Ok(Self::new(read(&paths.schema)?, read(&paths.seed)?))
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| CatalogError::Script {
        path: path.to_path_buf(),
        source,
    })
}
