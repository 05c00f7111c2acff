//! # Shop Configuration
//!
//! Economy rules and presentation timings, loaded once at startup from TOML.
//!
//! ```toml
//! shop_size = 5
//! reroll_cost = 2
//! xp_cost = 4
//! max_level = 10
//! unaffordable_policy = "suppress"
//! stale_slot_allowance = 1
//!
//! [transition]
//! collapse_secs = 0.15
//! expand_secs = 0.25
//! overshoot = 1.70158
//! reroll_timeout_secs = 3.0
//!
//! [notices]
//! capacity = 4
//! ttl_secs = 2.5
//! dedupe_window_secs = 0.5
//! ```

use std::path::Path;

use bazaar_shared::{DEFAULT_MAX_LEVEL, DEFAULT_REROLL_COST, DEFAULT_SHOP_SIZE, DEFAULT_XP_COST};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// What to do with a purchase or XP request the client cannot afford.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaffordablePolicy {
    /// Refuse locally, send nothing.
    #[default]
    Suppress,
    /// Send the command anyway and let the server arbitrate. No optimistic
    /// adjustment is recorded.
    ForwardToServer,
}

/// Timings for the reroll collapse/expand transition.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Duration of the shrink, in seconds.
    pub collapse_secs: f32,
    /// Duration of the grow, in seconds.
    pub expand_secs: f32,
    /// Back-out overshoot strength for the grow.
    pub overshoot: f32,
    /// Longest wait for a snapshot after the collapse, in seconds.
    pub reroll_timeout_secs: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            collapse_secs: 0.15,
            expand_secs: 0.25,
            overshoot: 1.701_58,
            reroll_timeout_secs: 3.0,
        }
    }
}

/// Rejection notice queue settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Maximum notices kept at once.
    pub capacity: usize,
    /// How long a notice stays visible, in seconds.
    pub ttl_secs: f32,
    /// Identical notices within this window are merged, in seconds.
    pub dedupe_window_secs: f32,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            ttl_secs: 2.5,
            dedupe_window_secs: 0.5,
        }
    }
}

/// Shop client configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Number of shop slots.
    pub shop_size: usize,
    /// Gold per paid reroll.
    pub reroll_cost: u32,
    /// Gold per XP purchase.
    pub xp_cost: u32,
    /// Level at which XP can no longer be bought.
    pub max_level: u32,
    /// Handling of unaffordable purchase/XP requests.
    pub unaffordable_policy: UnaffordablePolicy,
    /// Non-empty observations a pending purchase survives before it is
    /// presumed rejected.
    pub stale_slot_allowance: u32,
    /// Reroll transition timings.
    pub transition: TransitionConfig,
    /// Notice queue settings.
    pub notices: NoticeConfig,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            shop_size: DEFAULT_SHOP_SIZE,
            reroll_cost: DEFAULT_REROLL_COST,
            xp_cost: DEFAULT_XP_COST,
            max_level: DEFAULT_MAX_LEVEL,
            unaffordable_policy: UnaffordablePolicy::Suppress,
            stale_slot_allowance: 1,
            transition: TransitionConfig::default(),
            notices: NoticeConfig::default(),
        }
    }
}

impl ShopConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// Missing keys fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ShopConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "shop config loaded");
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.shop_size == 0 {
            return Err(ConfigError::Invalid("shop_size must be at least 1".into()));
        }
        if self.max_level == 0 {
            return Err(ConfigError::Invalid("max_level must be at least 1".into()));
        }
        let t = &self.transition;
        if !(t.collapse_secs > 0.0 && t.expand_secs > 0.0) {
            return Err(ConfigError::Invalid(
                "transition durations must be positive".into(),
            ));
        }
        if t.reroll_timeout_secs <= 0.0 {
            return Err(ConfigError::Invalid(
                "reroll_timeout_secs must be positive".into(),
            ));
        }
        if t.overshoot < 0.0 {
            return Err(ConfigError::Invalid("overshoot must not be negative".into()));
        }
        let n = &self.notices;
        if n.capacity == 0 || n.ttl_secs <= 0.0 || n.dedupe_window_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "notices need capacity >= 1, positive ttl and non-negative dedupe window".into(),
            ));
        }
        Ok(())
    }
}
