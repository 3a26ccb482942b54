// Core data models shared across the conversion and batch layers

pub mod status;

pub use status::{can_transition, is_terminal_status, transition_status, StatusTransitionError};

use crate::style::derive_short_name;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A menu entry with an optional price string (e.g. "9,000원").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: None,
        }
    }

    pub fn with_price(name: impl Into<String>, price: impl Into<String>) -> Self {
        let price = price.into();
        Self {
            name: name.into(),
            price: if price.is_empty() { None } else { Some(price) },
        }
    }

    /// Render as `이름 (가격)` or the bare name when no price is known.
    pub fn render(&self) -> String {
        match &self.price {
            Some(price) => format!("{} ({})", self.name, price),
            None => self.name.clone(),
        }
    }
}

/// Errors raised when a business profile fails structural validation.
///
/// These are surfaced before any generation call is made and are never
/// retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("business name is empty")]
    MissingName,

    #[error("business address is empty")]
    MissingAddress,

    #[error("profile has neither menu items nor features")]
    MissingMenuAndFeatures,

    #[error("ordered menu items are empty")]
    MissingOrderedItems,
}

/// Everything the generator knows about one business.
///
/// A profile is immutable once constructed. Batch runs share one resolved
/// profile across items and derive per-item copies through
/// [`BusinessProfile::with_keyword`]; nothing mutates a profile in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    /// Short form of the name used in titles. Derived from `name` when empty.
    #[serde(default)]
    pub short_name: String,
    /// SEO keywords in priority order; the first entry is the primary keyword.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub phone: String,
    /// Full menu as advertised.
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    /// The subset of the menu that was actually ordered and experienced.
    #[serde(default)]
    pub ordered_items: Vec<MenuItem>,
    /// Business characteristics; entries may carry the `[필수]` prefix to
    /// survive random down-selection.
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub atmosphere: String,
    #[serde(default)]
    pub target_customer: String,
    #[serde(default)]
    pub parking_info: String,
}

impl BusinessProfile {
    /// Check the structural invariants that must hold before a conversion may
    /// start.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::MissingName);
        }
        if self.address.trim().is_empty() {
            return Err(ProfileError::MissingAddress);
        }
        if self.menu_items.is_empty() && self.features.is_empty() {
            return Err(ProfileError::MissingMenuAndFeatures);
        }
        if self.ordered_items.is_empty() {
            return Err(ProfileError::MissingOrderedItems);
        }
        Ok(())
    }

    /// The short name if set, otherwise one derived from the full name.
    pub fn effective_short_name(&self) -> String {
        if self.short_name.trim().is_empty() {
            derive_short_name(&self.name)
        } else {
            self.short_name.clone()
        }
    }

    /// A new profile identical to this one except for the keyword list.
    ///
    /// This is how batch items get their per-item keyword without mutating
    /// the shared profile.
    pub fn with_keyword(&self, keyword: impl Into<String>) -> Self {
        let mut derived = self.clone();
        derived.keywords = vec![keyword.into()];
        derived
    }

    /// Extract a short locality name from the address for prompt rendering.
    ///
    /// A small fixed table of well-known districts, falling back to the
    /// second address token with 시/구 suffixes stripped.
    pub fn location_name(&self) -> String {
        for known in ["일산", "강남", "목포"] {
            if self.address.contains(known) {
                return known.to_string();
            }
        }
        let parts: Vec<&str> = self.address.split_whitespace().collect();
        if parts.len() >= 2 {
            return parts[1].replace('시', "").replace('구', "");
        }
        String::new()
    }
}

/// Lifecycle of one work item inside a batch run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Pending
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Success => "success",
            ItemStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One row of a batch job: a source text, a target keyword, and an optional
/// business-preset reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Stable ordinal from the work list.
    pub index: usize,
    pub source_file: PathBuf,
    pub keyword: String,
    /// Preset filename this item resolves its profile from, if any.
    pub preset_ref: Option<String>,
    /// Name of the business this item ended up being generated for. Filled in
    /// once the profile is resolved during the run.
    pub business_name: Option<String>,
    pub status: ItemStatus,
    pub result_text: Option<String>,
    pub error: Option<String>,
    pub retry_count: u32,
    pub elapsed_secs: f64,
    pub output_path: Option<PathBuf>,
}

impl WorkItem {
    pub fn new(index: usize, source_file: impl Into<PathBuf>, keyword: impl Into<String>) -> Self {
        Self {
            index,
            source_file: source_file.into(),
            keyword: keyword.into(),
            preset_ref: None,
            business_name: None,
            status: ItemStatus::Pending,
            result_text: None,
            error: None,
            retry_count: 0,
            elapsed_secs: 0.0,
            output_path: None,
        }
    }

    pub fn with_preset_ref(mut self, preset_ref: impl Into<String>) -> Self {
        let preset_ref = preset_ref.into();
        self.preset_ref = if preset_ref.is_empty() {
            None
        } else {
            Some(preset_ref)
        };
        self
    }

    /// Move this item to a new status, enforcing the allowed transitions.
    pub fn set_status(&mut self, target: ItemStatus) -> Result<(), StatusTransitionError> {
        self.status = transition_status(self.status, target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> BusinessProfile {
        BusinessProfile {
            name: "대종칼국수".to_string(),
            address: "경기 고양시 일산동구".to_string(),
            ordered_items: vec![MenuItem::with_price("바지락칼국수", "9,000원")],
            features: vec!["14시간 우려낸 사골 육수".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_complete_profile() {
        assert!(sample_profile().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_name() {
        let mut profile = sample_profile();
        profile.name = "  ".to_string();
        assert_eq!(profile.validate(), Err(ProfileError::MissingName));
    }

    #[test]
    fn test_validate_rejects_missing_address() {
        let mut profile = sample_profile();
        profile.address = String::new();
        assert_eq!(profile.validate(), Err(ProfileError::MissingAddress));
    }

    #[test]
    fn test_validate_requires_menu_or_features() {
        let mut profile = sample_profile();
        profile.menu_items.clear();
        profile.features.clear();
        assert_eq!(profile.validate(), Err(ProfileError::MissingMenuAndFeatures));
    }

    #[test]
    fn test_validate_requires_ordered_items() {
        let mut profile = sample_profile();
        profile.ordered_items.clear();
        assert_eq!(profile.validate(), Err(ProfileError::MissingOrderedItems));
    }

    #[test]
    fn test_with_keyword_leaves_original_untouched() {
        let profile = sample_profile();
        let derived = profile.with_keyword("일산 칼국수 맛집");
        assert_eq!(derived.keywords, vec!["일산 칼국수 맛집".to_string()]);
        assert!(profile.keywords.is_empty());
        assert_eq!(derived.name, profile.name);
        assert_eq!(derived.ordered_items, profile.ordered_items);
    }

    #[test]
    fn test_location_name_from_table() {
        assert_eq!(sample_profile().location_name(), "일산");
    }

    #[test]
    fn test_location_name_fallback_strips_suffixes() {
        let mut profile = sample_profile();
        profile.address = "전남 순천시 조례동 123".to_string();
        assert_eq!(profile.location_name(), "순천");
    }

    #[test]
    fn test_menu_item_render() {
        assert_eq!(
            MenuItem::with_price("보리굴비정식", "15,000원").render(),
            "보리굴비정식 (15,000원)"
        );
        assert_eq!(MenuItem::new("칼국수").render(), "칼국수");
        assert_eq!(MenuItem::with_price("냉면", "").render(), "냉면");
    }

    #[test]
    fn test_work_item_retry_transitions() {
        let mut item = WorkItem::new(0, "blog1.txt", "일산 칼국수 맛집");
        assert!(item.set_status(ItemStatus::Processing).is_ok());
        assert!(item.set_status(ItemStatus::Failed).is_ok());
        // Retried in place
        assert!(item.set_status(ItemStatus::Processing).is_ok());
        assert!(item.set_status(ItemStatus::Success).is_ok());
    }

    #[test]
    fn test_work_item_rejects_skipping_processing() {
        let mut item = WorkItem::new(0, "blog1.txt", "키워드");
        assert!(item.set_status(ItemStatus::Success).is_err());
        assert_eq!(item.status, ItemStatus::Pending);
    }

    #[test]
    fn test_with_preset_ref_empty_is_none() {
        let item = WorkItem::new(0, "a.txt", "kw").with_preset_ref("");
        assert!(item.preset_ref.is_none());
    }
}
