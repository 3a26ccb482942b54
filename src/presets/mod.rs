//! Business preset persistence
//!
//! Presets are JSON files in a preset directory, one per business, keyed by
//! filename. The batch layer resolves work-item preset references through
//! this store and treats every failure here as recoverable.

pub mod document;

pub use document::{parse_business_document, DocumentError};

use crate::models::{BusinessProfile, MenuItem};
use crate::style::derive_short_name;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset '{name}' not found")]
    NotFound { name: String },

    #[error("failed to read preset '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preset '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The fixed field set a preset file carries. Per-item keywords are not part
/// of a preset; they come from the work list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PresetRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    short_name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    hours: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    menu_items: Vec<MenuItem>,
    #[serde(default)]
    ordered_items: Vec<MenuItem>,
    #[serde(default)]
    atmosphere: String,
    #[serde(default)]
    target_customer: String,
    #[serde(default)]
    parking_info: String,
}

impl From<&BusinessProfile> for PresetRecord {
    fn from(profile: &BusinessProfile) -> Self {
        Self {
            name: profile.name.clone(),
            short_name: profile.short_name.clone(),
            address: profile.address.clone(),
            hours: profile.hours.clone(),
            phone: profile.phone.clone(),
            features: profile.features.clone(),
            menu_items: profile.menu_items.clone(),
            ordered_items: profile.ordered_items.clone(),
            atmosphere: profile.atmosphere.clone(),
            target_customer: profile.target_customer.clone(),
            parking_info: profile.parking_info.clone(),
        }
    }
}

impl PresetRecord {
    fn into_profile(self) -> BusinessProfile {
        let short_name = if self.short_name.trim().is_empty() && !self.name.is_empty() {
            derive_short_name(&self.name)
        } else {
            self.short_name
        };
        BusinessProfile {
            name: self.name,
            short_name,
            keywords: Vec::new(),
            address: self.address,
            hours: self.hours,
            phone: self.phone,
            menu_items: normalize_prices(self.menu_items),
            ordered_items: normalize_prices(self.ordered_items),
            features: self.features,
            atmosphere: self.atmosphere,
            target_customer: self.target_customer,
            parking_info: self.parking_info,
        }
    }
}

/// Older preset files store absent prices as empty strings.
fn normalize_prices(items: Vec<MenuItem>) -> Vec<MenuItem> {
    items
        .into_iter()
        .map(|mut item| {
            if item.price.as_deref() == Some("") {
                item.price = None;
            }
            item
        })
        .collect()
}

/// JSON-file preset store rooted at one directory.
pub struct PresetStore {
    dir: PathBuf,
}

impl PresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Load a preset by filename. The returned profile has `short_name`
    /// defaulted and an empty keyword list.
    pub fn load(&self, filename: &str) -> Result<BusinessProfile, PresetError> {
        let path = self.path_for(filename);
        if !path.exists() {
            return Err(PresetError::NotFound {
                name: filename.to_string(),
            });
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| PresetError::Io {
            name: filename.to_string(),
            source,
        })?;
        let record: PresetRecord =
            serde_json::from_str(&contents).map_err(|source| PresetError::Parse {
                name: filename.to_string(),
                source,
            })?;
        Ok(record.into_profile())
    }

    /// Save a profile as a preset. Defaults the filename to `{name}.json`.
    pub fn save(
        &self,
        profile: &BusinessProfile,
        filename: Option<&str>,
    ) -> Result<PathBuf, PresetError> {
        let filename = match filename {
            Some(f) => f.to_string(),
            None => format!("{}.json", profile.name),
        };
        std::fs::create_dir_all(&self.dir).map_err(|source| PresetError::Io {
            name: filename.clone(),
            source,
        })?;
        let record = PresetRecord::from(profile);
        let contents = serde_json::to_string_pretty(&record).map_err(|source| PresetError::Parse {
            name: filename.clone(),
            source,
        })?;
        let path = self.path_for(&filename);
        std::fs::write(&path, contents).map_err(|source| PresetError::Io {
            name: filename.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Sorted list of stored preset filenames.
    pub fn list(&self) -> Result<Vec<String>, PresetError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|source| PresetError::Io {
            name: self.dir.display().to_string(),
            source,
        })?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json"))
            .collect();
        names.sort();
        Ok(names)
    }
}
