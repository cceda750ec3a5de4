//! The threshold-voltage ladder and the library transition table.
//!
//! A [`VariantModel`] answers one question: given a cell's current library
//! and reference name, which library cell is one step up (or down) the
//! ladder? Each `(library, step)` pair maps to a target library and a prefix
//! substitution on the reference name, so `LVT_NAND2X1` in `lib_lvt` becomes
//! `SVT_NAND2X1` in `lib_svt`.

use crate::error::{EngineError, EngineResult};
use leakopt_common::{Step, VariantRef};
use leakopt_config::LeakoptConfig;
use std::collections::HashMap;

/// A name-substitution rule for one `(library, step)` transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionRule {
    /// The library the cell moves to.
    pub target_library: String,
    /// Prefix every source reference name must start with.
    pub pattern: String,
    /// Prefix that replaces `pattern` in the target library.
    pub replacement: String,
}

/// Static ladder plus transition table.
#[derive(Clone, Debug, Default)]
pub struct VariantModel {
    groups: Vec<String>,
    library_level: HashMap<String, usize>,
    rules: HashMap<(String, Step), TransitionRule>,
}

impl VariantModel {
    /// Creates a model with the given ladder (lowest group first) and no transitions.
    pub fn new(groups: Vec<String>) -> Self {
        Self {
            groups,
            library_level: HashMap::new(),
            rules: HashMap::new(),
        }
    }

    /// Builds a model from a validated configuration.
    pub fn from_config(config: &LeakoptConfig) -> Self {
        let mut model = Self::new(config.ladder.groups.clone());
        for t in &config.transitions {
            let level = model
                .groups
                .iter()
                .position(|g| *g == t.group)
                .unwrap_or_default();
            model.library_level.insert(t.library.clone(), level);
            for (step, rule) in [(Step::Up, &t.up), (Step::Down, &t.down)] {
                if let Some(rule) = rule {
                    model.add_rule(&t.library, step, &rule.library, &rule.from, &rule.to);
                }
            }
        }
        model
    }

    /// Declares which ladder level a library belongs to.
    pub fn add_library(&mut self, library: &str, level: usize) -> &mut Self {
        self.library_level.insert(library.to_string(), level);
        self
    }

    /// Declares the transition for `(library, step)`.
    pub fn add_rule(
        &mut self,
        library: &str,
        step: Step,
        target_library: &str,
        pattern: &str,
        replacement: &str,
    ) -> &mut Self {
        self.rules.insert(
            (library.to_string(), step),
            TransitionRule {
                target_library: target_library.to_string(),
                pattern: pattern.to_string(),
                replacement: replacement.to_string(),
            },
        );
        self
    }

    /// Returns the ladder's group aliases, lowest first.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns the index of the lowest ladder level.
    pub fn lowest_level(&self) -> usize {
        0
    }

    /// Returns the index of the highest ladder level.
    pub fn highest_level(&self) -> usize {
        self.groups.len().saturating_sub(1)
    }

    /// Returns the ladder level a library was declared at, if any.
    pub fn level_of(&self, library: &str) -> Option<usize> {
        self.library_level.get(library).copied()
    }

    /// Returns the rule for `(library, step)`, if declared.
    pub fn rule(&self, library: &str, step: Step) -> Option<&TransitionRule> {
        self.rules.get(&(library.to_string(), step))
    }

    /// Resolves the alternative variant one `step` away from `(library, ref_name)`.
    ///
    /// Callers must only ask for transitions that exist: a cell at the top of
    /// the ladder has no `Up` rule, and the reference name must carry the
    /// rule's prefix. Both cases are reported as errors and abort the caller.
    pub fn resolve_alternative(
        &self,
        library: &str,
        ref_name: &str,
        step: Step,
    ) -> EngineResult<VariantRef> {
        let rule = self
            .rule(library, step)
            .ok_or_else(|| EngineError::NoTransition {
                library: library.to_string(),
                step,
            })?;
        let suffix =
            ref_name
                .strip_prefix(rule.pattern.as_str())
                .ok_or_else(|| EngineError::PrefixMismatch {
                    library: library.to_string(),
                    ref_name: ref_name.to_string(),
                    pattern: rule.pattern.clone(),
                    step,
                })?;
        Ok(VariantRef::new(
            rule.target_library.clone(),
            format!("{}{suffix}", rule.replacement),
        ))
    }

    /// Shorthand for resolving one step up from a qualified variant.
    pub fn step_up(&self, variant: &VariantRef) -> EngineResult<VariantRef> {
        self.resolve_alternative(&variant.library, &variant.ref_name, Step::Up)
    }
}
