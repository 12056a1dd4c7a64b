//! Settings service
//!
//! Cache-backed reads over the key/value settings table. One normalization
//! rule applies everywhere — trim plus ASCII lowercase — for cache keys, the
//! database comparison, and the aggregate map. Negative lookups are not
//! cached.

use crate::cache::{keys, MemoryCache};
use crate::db::{Repository, SettingView};
use crate::errors::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Normalize a setting name for lookup and cache keys
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Cache-backed settings reads
pub struct SettingsService {
    repo: Repository,
    cache: Arc<MemoryCache>,
}

impl SettingsService {
    /// Create a new settings service
    pub fn new(repo: Repository, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Get one setting by name; lookups tolerate case and whitespace
    /// variation. Found values are cached until the expiry horizon.
    pub async fn get(&self, name: &str) -> Result<Option<SettingView>> {
        let normalized = normalize_name(name);
        let cache_key = keys::setting(&normalized);

        if let Some(cached) = self.cache.get::<SettingView>(&cache_key).await? {
            return Ok(Some(cached));
        }

        let Some(setting) = self.repo.find_setting_by_name(&normalized).await? else {
            return Ok(None);
        };

        let view = SettingView {
            name: normalized,
            value: setting.value,
        };
        self.cache.set(&cache_key, &view).await?;

        Ok(Some(view))
    }

    /// All settings as a normalized name-to-value mapping
    pub async fn list(&self) -> Result<BTreeMap<String, Option<String>>> {
        let repo = self.repo.clone();
        self.cache
            .get_or_load(&keys::all_settings(), || async move {
                let settings = repo.list_settings().await?;
                Ok(settings
                    .into_iter()
                    .map(|s| (normalize_name(&s.name), s.value))
                    .collect())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Smtp_Host  "), "smtp_host");
        assert_eq!(normalize_name("BASEURL"), "baseurl");
        assert_eq!(normalize_name("already_lower"), "already_lower");
    }
}
