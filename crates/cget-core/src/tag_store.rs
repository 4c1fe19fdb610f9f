//! Persistent URL -> freshness tag map, so conditional requests survive restarts.
//!
//! Stored as TOML under the XDG state dir (`~/.local/state/cget/tags.toml`),
//! each tag in its `<mtime> <etag>` serialized form.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::tag::FreshnessTag;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TagFile {
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

/// Tags keyed by URL. Changes are kept in memory until `save`.
#[derive(Debug)]
pub struct TagStore {
    path: PathBuf,
    tags: BTreeMap<String, FreshnessTag>,
}

impl TagStore {
    /// Default location: `tags.toml` in the XDG state dir.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("cget")?;
        Ok(xdg_dirs.place_state_file("tags.toml")?)
    }

    pub fn open_default() -> Result<Self> {
        Self::open_at(&Self::default_path()?)
    }

    /// Open the store at `path`; a missing file is an empty store.
    /// Entries that do not parse as tags are skipped.
    pub fn open_at(path: &Path) -> Result<Self> {
        let mut tags = BTreeMap::new();
        if path.exists() {
            let data =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            let file: TagFile =
                toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
            for (url, raw) in file.tags {
                match raw.parse::<FreshnessTag>() {
                    Ok(tag) => {
                        tags.insert(url, tag);
                    }
                    Err(e) => tracing::warn!("skipping stored tag for {}: {}", url, e),
                }
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            tags,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, url: &str) -> Option<&FreshnessTag> {
        self.tags.get(url)
    }

    pub fn put(&mut self, url: &str, tag: &FreshnessTag) {
        self.tags.insert(url.to_string(), tag.clone());
    }

    pub fn remove(&mut self, url: &str) -> Option<FreshnessTag> {
        self.tags.remove(url)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Write the store back to disk (temp file + rename).
    pub fn save(&self) -> Result<()> {
        let file = TagFile {
            tags: self
                .tags
                .iter()
                .map(|(url, tag)| (url.clone(), tag.to_string()))
                .collect(),
        };
        let toml = toml::to_string_pretty(&file).context("serialize tag store")?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("toml.part");
        fs::write(&tmp, toml).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| {
            format!("rename {} to {}", tmp.display(), self.path.display())
        })?;
        tracing::debug!("saved {} tags to {}", self.tags.len(), self.path.display());
        Ok(())
    }
}
