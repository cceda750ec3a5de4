//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{LeakoptConfig, TransitionConfig};
use std::collections::HashMap;
use std::path::Path;

/// Loads and validates a `leakopt.toml` configuration from the given path.
pub fn load_config(path: &Path) -> Result<LeakoptConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `leakopt.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<LeakoptConfig, ConfigError> {
    let config: LeakoptConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates ladder shape, transition-table completeness, and recipe ranges.
///
/// Every library not on the highest group must declare an `up` rule, every
/// library not on the lowest group a `down` rule, and each rule must target
/// a declared library exactly one group away in its direction.
pub fn validate_config(config: &LeakoptConfig) -> Result<(), ConfigError> {
    let groups = &config.ladder.groups;
    if groups.is_empty() {
        return Err(ConfigError::ValidationError(
            "ladder.groups must not be empty".to_string(),
        ));
    }
    let mut level_of: HashMap<&str, usize> = HashMap::new();
    for (level, group) in groups.iter().enumerate() {
        if level_of.insert(group.as_str(), level).is_some() {
            return Err(ConfigError::ValidationError(format!(
                "duplicate threshold group '{group}'"
            )));
        }
    }

    let mut library_level: HashMap<&str, usize> = HashMap::new();
    for t in &config.transitions {
        let level = *level_of
            .get(t.group.as_str())
            .ok_or_else(|| ConfigError::UnknownGroup(t.group.clone()))?;
        if library_level.insert(t.library.as_str(), level).is_some() {
            return Err(ConfigError::ValidationError(format!(
                "duplicate transition entry for library '{}'",
                t.library
            )));
        }
    }

    let highest = groups.len() - 1;
    for t in &config.transitions {
        let level = library_level[t.library.as_str()];
        check_rule(t, "up", level < highest, level + 1, &library_level)?;
        check_rule(t, "down", level > 0, level.wrapping_sub(1), &library_level)?;
    }

    validate_recipe(config)
}

fn check_rule(
    t: &TransitionConfig,
    direction: &'static str,
    required: bool,
    expected_level: usize,
    library_level: &HashMap<&str, usize>,
) -> Result<(), ConfigError> {
    let rule = if direction == "up" { &t.up } else { &t.down };
    let Some(rule) = rule else {
        if required {
            return Err(ConfigError::MissingRule {
                library: t.library.clone(),
                direction,
            });
        }
        return Ok(());
    };
    if !required {
        return Err(ConfigError::ValidationError(format!(
            "library '{}' is at a ladder extreme and cannot move {direction}",
            t.library
        )));
    }
    let target_level = *library_level
        .get(rule.library.as_str())
        .ok_or_else(|| ConfigError::UnknownLibrary(rule.library.clone()))?;
    if target_level != expected_level {
        return Err(ConfigError::ValidationError(format!(
            "'{direction}' rule of '{}' targets '{}', which is not one level {direction}",
            t.library, rule.library
        )));
    }
    if rule.from.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "'{direction}' rule of '{}' has an empty prefix pattern",
            t.library
        )));
    }
    Ok(())
}

fn validate_recipe(config: &LeakoptConfig) -> Result<(), ConfigError> {
    let r = &config.recipe;
    if r.max_duration.is_zero() {
        return Err(ConfigError::ValidationError(
            "recipe.max_duration must be positive".to_string(),
        ));
    }
    if r.global_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "recipe.global_batch_size must be at least 1".to_string(),
        ));
    }
    if r.fast_local_swap_count == 0 {
        return Err(ConfigError::ValidationError(
            "recipe.fast_local_swap_count must be at least 1".to_string(),
        ));
    }
    if !(r.accurate_select_fraction > 0.0 && r.accurate_select_fraction <= 1.0) {
        return Err(ConfigError::ValidationError(
            "recipe.accurate_select_fraction must be in (0, 1]".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&r.accurate_derate) {
        return Err(ConfigError::ValidationError(
            "recipe.accurate_derate must be in [0, 1)".to_string(),
        ));
    }
    if !r.tight_slack_margin.is_finite() {
        return Err(ConfigError::ValidationError(
            "recipe.tight_slack_margin must be finite".to_string(),
        ));
    }
    Ok(())
}
