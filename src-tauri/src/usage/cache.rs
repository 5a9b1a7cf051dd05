//! One-entry cache for the resolved organization id.
//!
//! Written once after the first successful bootstrap fetch, read on every
//! cycle after that. No expiry; only an explicit `clear()` drops it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const ORG_CACHE_FILE_NAME: &str = "org.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct OrgCacheFile {
    org_id: Option<String>,
}

/// Cache for the organization id, optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct OrgCache {
    org_id: Option<String>,
    path: Option<PathBuf>,
}

impl OrgCache {
    /// Cache that lives only for this process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache from `path`. A missing or corrupt file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let org_id = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<OrgCacheFile>(&contents) {
                Ok(file) => file.org_id.filter(|id| !id.is_empty()),
                Err(e) => {
                    log::warn!("OrgCache: failed to parse {:?}: {}", path, e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("OrgCache: failed to read {:?}: {}", path, e);
                None
            }
        };

        if org_id.is_some() {
            log::debug!("OrgCache: loaded organization id from {:?}", path);
        }

        Self {
            org_id,
            path: Some(path),
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.org_id.as_deref()
    }

    /// Store the id. Persisting is best effort; the in-memory value is kept either way.
    pub fn set(&mut self, org_id: String) {
        self.org_id = Some(org_id);
        if let Some(path) = &self.path {
            let file = OrgCacheFile {
                org_id: self.org_id.clone(),
            };
            if let Err(e) = write_atomic(path, &file) {
                log::warn!("OrgCache: {}", e);
            }
        }
    }

    pub fn clear(&mut self) {
        self.org_id = None;
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => log::info!("OrgCache: cleared"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("OrgCache: failed to remove {:?}: {}", path, e),
            }
        }
    }
}

fn write_atomic(path: &Path, file: &OrgCacheFile) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory {:?}: {}", parent, e))?;
    }

    let contents =
        serde_json::to_string_pretty(file).map_err(|e| format!("Serialize org cache: {}", e))?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &contents)
        .map_err(|e| format!("Write temp org cache {:?}: {}", tmp_path, e))?;

    // Windows rename fails if the destination exists.
    if cfg!(windows) && path.exists() {
        std::fs::remove_file(path)
            .map_err(|e| format!("Remove existing org cache {:?}: {}", path, e))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| format!("Rename temp org cache {:?} to {:?}: {}", tmp_path, path, e))
}
