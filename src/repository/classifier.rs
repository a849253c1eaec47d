// file: src/repository/classifier.rs
// description: file type and category classification
// reference: configurable path-based classification

use crate::config::{CategoryRule, ClassificationConfig};

/// Type label for names without an extension.
pub const UNKNOWN_TYPE: &str = "N/A";

#[derive(Debug, Clone)]
pub struct FileClassifier {
    categories: Vec<CategoryRule>,
    default_category: String,
}

impl FileClassifier {
    pub fn new(categories: Vec<CategoryRule>, default_category: impl Into<String>) -> Self {
        Self {
            categories,
            default_category: default_category.into(),
        }
    }

    pub fn from_config(config: &ClassificationConfig) -> Self {
        Self::new(config.categories.clone(), config.default_category.clone())
    }

    /// Extract category from a server path based on configured rules.
    /// Returns the first matching category or the configured default.
    pub fn extract_category(&self, path: &str) -> String {
        let path = path.to_lowercase();

        for rule in &self.categories {
            for keyword in &rule.keywords {
                if path.contains(&keyword.to_lowercase()) {
                    return rule.category.clone();
                }
            }
        }

        self.default_category.clone()
    }

    /// Upper-cased extension of `name`.
    pub fn file_type(&self, name: &str) -> String {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.trim().is_empty() => {
                ext.trim().to_uppercase()
            }
            _ => UNKNOWN_TYPE.to_string(),
        }
    }
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::from_config(&ClassificationConfig::default())
    }
}
