//! Configuration types deserialized from `leakopt.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// The top-level optimizer configuration parsed from `leakopt.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LeakoptConfig {
    /// The threshold-voltage ladder, lowest leakage-to-delay trade-off first.
    pub ladder: LadderConfig,
    /// One entry per library that participates in threshold swapping.
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
    /// Strategy selection and budget knobs.
    #[serde(default)]
    pub recipe: RecipeConfig,
}

/// The ordered list of threshold-group aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct LadderConfig {
    /// Group aliases from lowest (fastest, leakiest) to highest.
    pub groups: Vec<String>,
}

/// Transition rules for one library.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionConfig {
    /// The library these rules apply to.
    pub library: String,
    /// The threshold group every cell of this library belongs to.
    pub group: String,
    /// Rule for moving one level up the ladder.
    #[serde(default)]
    pub up: Option<RuleConfig>,
    /// Rule for moving one level down the ladder.
    #[serde(default)]
    pub down: Option<RuleConfig>,
}

/// A target library plus the reference-name prefix substitution.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Target library name.
    pub library: String,
    /// Prefix expected at the start of every source reference name.
    pub from: String,
    /// Replacement prefix in the target library.
    pub to: String,
}

/// Knobs for strategy selection and the two optimization loops.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecipeConfig {
    /// Wall-clock ceiling for the whole run.
    ///
    /// Accepts either a number of seconds or a string such as `"90s"`,
    /// `"5m"` or `"1h"`.
    #[serde(deserialize_with = "deserialize_duration")]
    pub max_duration: Duration,
    /// Designs with more cells than this are candidates for the fast strategy.
    pub large_design_cells: usize,
    /// Initial worst slack below this margin (with a large design) selects
    /// the fast strategy.
    pub tight_slack_margin: f64,
    /// Number of cells the fast local loop swaps per pass.
    pub fast_local_swap_count: usize,
    /// Initial batch size for the global loop, both strategies.
    pub global_batch_size: usize,
    /// Selection fraction for the accurate local loop.
    pub accurate_select_fraction: f64,
    /// Derate fraction applied after a rejected accurate local batch.
    pub accurate_derate: f64,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(300),
            large_design_cells: 20_000,
            tight_slack_margin: 0.05,
            fast_local_swap_count: 500,
            global_batch_size: 4,
            accurate_select_fraction: 1.0,
            accurate_derate: 0.9,
        }
    }
}

/// Deserializes a duration given either as integer/float seconds or as a
/// string with an `s`, `m` or `h` suffix.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a number of seconds or a string like \"5m\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("duration must not be negative"))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Duration::try_from_secs_f64(v).map_err(E::custom)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_duration(v).ok_or_else(|| E::custom(format!("invalid duration '{v}'")))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}

/// Parses `"<number><unit>"` where unit is `s`, `m` or `h`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| c.is_ascii_alphabetic())?;
    let (value, unit) = s.split_at(split);
    let value: f64 = value.trim().parse().ok()?;
    let scale = match unit {
        "s" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        _ => return None,
    };
    Duration::try_from_secs_f64(value * scale).ok()
}
