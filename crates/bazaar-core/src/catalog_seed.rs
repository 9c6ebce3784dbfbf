use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A size or color entry in the seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A category and the categories nested below it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub children: Vec<CategorySeed>,
}

impl CategorySeed {
    /// Number of categories in this subtree, including itself.
    #[must_use]
    fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(CategorySeed::subtree_len).sum::<usize>()
    }
}

/// Reference data loaded by `bazaar-cli db seed`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub sizes: Vec<OptionSeed>,
    #[serde(default)]
    pub colors: Vec<OptionSeed>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

impl CatalogSeed {
    /// Total number of categories at every depth.
    #[must_use]
    pub fn category_count(&self) -> usize {
        self.categories.iter().map(CategorySeed::subtree_len).sum()
    }
}

fn default_active() -> bool {
    true
}

/// Load and validate the catalog seed from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog_seed(path: &Path) -> Result<CatalogSeed, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seed: CatalogSeed = serde_yaml::from_str(&content)?;
    validate_catalog_seed(&seed)?;
    Ok(seed)
}

fn validate_catalog_seed(seed: &CatalogSeed) -> Result<(), ConfigError> {
    validate_options("size", &seed.sizes)?;
    validate_options("color", &seed.colors)?;
    validate_siblings(&seed.categories)
}

fn validate_options(kind: &str, options: &[OptionSeed]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for option in options {
        if option.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{kind} name must be non-empty"
            )));
        }
        if !seen.insert(option.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate {kind} name: '{}'",
                option.name
            )));
        }
    }
    Ok(())
}

/// Names must be unique among siblings so a path identifies one category.
fn validate_siblings(categories: &[CategorySeed]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for category in categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }
        if !seen.insert(category.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name among siblings: '{}'",
                category.name
            )));
        }
        validate_siblings(&category.children)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "catalog_seed_test.rs"]
mod tests;
