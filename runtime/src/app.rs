//! The normalized app record returned by every provider.

use serde::{Deserialize, Serialize};

/// Store metadata for a single application.
///
/// Built field-by-field while a provider extracts it and handed back by
/// value. A failed lookup never produces a partially filled `App`; only the
/// error is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// Store-native identifier (numeric track id, AppGallery id). Empty when
    /// the store page does not expose one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_id: String,
    /// Reverse-domain package identifier.
    pub bundle_id: String,
    /// Canonical public page for the app.
    pub url: String,
    pub title: String,
    /// Store-native version string, never parsed.
    pub version: String,
    /// Last update, `DD-MM-YYYY`.
    pub updated: String,
    pub developer: String,
}

impl App {
    /// Look up a field by its JSON name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "appId" => &self.app_id,
            "bundleId" => &self.bundle_id,
            "url" => &self.url,
            "title" => &self.title,
            "version" => &self.version,
            "updated" => &self.updated,
            "developer" => &self.developer,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Check that every named field is non-empty, returning the first
    /// offender.
    pub fn first_missing<'a>(&self, required: &[&'a str]) -> Option<&'a str> {
        required
            .iter()
            .copied()
            .find(|name| self.field(name).map_or(true, |v| v.trim().is_empty()))
    }
}
