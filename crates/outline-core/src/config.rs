//! Outline configuration.
//!
//! Hosts usually keep settings in JSON or YAML; both load into [`OutlineConfig`] with every
//! key optional.

use crate::error::OutlineError;
use crate::symbols::SymbolKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which editor event drives automatic expansion and focus in the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowMode {
    /// Follow the cursor selection.
    Cursor,
    /// Follow the visible viewport.
    #[default]
    Viewport,
    /// Never expand automatically.
    Manual,
}

/// The three leading keywords recognized by the region parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionKeywords {
    /// Keyword opening a region.
    pub start: String,
    /// Keyword closing a region.
    pub end: String,
    /// Keyword introducing a tag.
    pub tag: String,
}

impl Default for RegionKeywords {
    fn default() -> Self {
        Self {
            start: "#region".to_string(),
            end: "#endregion".to_string(),
            tag: "#tag".to_string(),
        }
    }
}

/// Outline settings. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutlineConfig {
    /// Kind names to hide from the outline (case-insensitive).
    pub hidden_item: Vec<String>,
    /// Keyword opening a region.
    pub region_start: String,
    /// Keyword closing a region.
    pub region_end: String,
    /// Keyword introducing a tag.
    pub tag: String,
    /// Whether comment regions and tags are scanned at all.
    pub region_enabled: bool,
    /// Default expansion depth; 0 means unlimited.
    pub default_max_depth: usize,
    /// Which editor event drives automatic expansion.
    pub follow: FollowMode,
    /// Surface symbol-fetch exhaustion as an error.
    pub debug: bool,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        let keywords = RegionKeywords::default();
        Self {
            hidden_item: Vec::new(),
            region_start: keywords.start,
            region_end: keywords.end,
            tag: keywords.tag,
            region_enabled: true,
            default_max_depth: 0,
            follow: FollowMode::default(),
            debug: false,
        }
    }
}

impl OutlineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(input: &str) -> Result<Self, OutlineError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(input: &str) -> Result<Self, OutlineError> {
        let config: Self = serde_yaml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the region keywords are non-empty and pairwise distinct.
    pub fn validate(&self) -> Result<(), OutlineError> {
        let keywords = [
            ("regionStart", &self.region_start),
            ("regionEnd", &self.region_end),
            ("tag", &self.tag),
        ];
        for (key, value) in keywords {
            if value.trim().is_empty() {
                return Err(OutlineError::InvalidConfig(format!("`{key}` must not be empty")));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(OutlineError::InvalidConfig(format!(
                    "`{key}` must not contain whitespace"
                )));
            }
        }
        for (i, (key_a, a)) in keywords.iter().enumerate() {
            for (key_b, b) in &keywords[i + 1..] {
                if a == b {
                    return Err(OutlineError::InvalidConfig(format!(
                        "`{key_a}` and `{key_b}` are both `{a}`"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The region keywords as a group.
    pub fn region_keywords(&self) -> RegionKeywords {
        RegionKeywords {
            start: self.region_start.clone(),
            end: self.region_end.clone(),
            tag: self.tag.clone(),
        }
    }

    /// Resolve `hidden_item` into kinds. Unknown names are skipped with a warning.
    pub fn hidden_kinds(&self) -> BTreeSet<SymbolKind> {
        let mut kinds = BTreeSet::new();
        for name in &self.hidden_item {
            match SymbolKind::from_name(name.trim()) {
                Some(kind) => {
                    kinds.insert(kind);
                }
                None => tracing::warn!(kind = %name, "ignoring unknown hidden symbol kind"),
            }
        }
        kinds
    }

    /// The default expansion depth, `None` when unlimited.
    pub fn max_depth(&self) -> Option<usize> {
        (self.default_max_depth > 0).then_some(self.default_max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OutlineConfig::default();
        assert_eq!(config.region_start, "#region");
        assert_eq!(config.region_end, "#endregion");
        assert_eq!(config.tag, "#tag");
        assert!(config.region_enabled);
        assert_eq!(config.follow, FollowMode::Viewport);
        assert_eq!(config.max_depth(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = OutlineConfig::from_json_str(
            r#"{ "hiddenItem": ["Variable", "region", "bogus"], "defaultMaxDepth": 2, "follow": "cursor" }"#,
        )
        .unwrap();
        assert_eq!(config.max_depth(), Some(2));
        assert_eq!(config.follow, FollowMode::Cursor);
        let hidden = config.hidden_kinds();
        assert!(hidden.contains(&SymbolKind::Variable));
        assert!(hidden.contains(&SymbolKind::Region));
        assert_eq!(hidden.len(), 2);
        assert_eq!(config.tag, "#tag");
    }

    #[test]
    fn test_yaml() {
        let config = OutlineConfig::from_yaml_str(
            "regionStart: \"// region\"\nregionEnd: \"// endregion\"\n",
        );
        // Whitespace in keywords is rejected.
        assert!(matches!(config, Err(OutlineError::InvalidConfig(_))));

        let config =
            OutlineConfig::from_yaml_str("regionStart: \"@region\"\nregionEnd: \"@end\"\ndebug: true\n")
                .unwrap();
        assert_eq!(config.region_keywords().start, "@region");
        assert_eq!(config.region_keywords().end, "@end");
        assert!(config.debug);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty() {
        let mut config = OutlineConfig {
            tag: "#region".to_string(),
            ..OutlineConfig::default()
        };
        assert!(matches!(config.validate(), Err(OutlineError::InvalidConfig(_))));

        config.tag = String::new();
        assert!(matches!(config.validate(), Err(OutlineError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            OutlineConfig::from_json_str("{ not json"),
            Err(OutlineError::Json(_))
        ));
    }
}
