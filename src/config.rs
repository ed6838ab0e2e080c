//! Site configuration from TOML plus a few environment overrides.
//!
//! SITE_CONFIG_PATH points at the TOML file (optional). On any IO/parse
//! error the defaults below are used and the problem is logged.
//! Env overrides applied afterwards: CONTENT_DIR, STATIC_DIR, DEFAULT_LOCALE.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::Locale;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct SiteConfig {
  #[serde(default)]
  pub site: SiteSection,
  #[serde(default)]
  pub game: GameRules,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SiteSection {
  pub content_dir: PathBuf,
  pub static_dir: PathBuf,
  pub default_locale: Locale,
  /// Name of the cookie persisting the visitor's locale preference.
  pub locale_cookie: String,
  pub cookie_max_age_secs: u64,
  /// How many courses the home page features.
  pub featured_courses: usize,
}

impl Default for SiteSection {
  fn default() -> Self {
    Self {
      content_dir: PathBuf::from("content"),
      static_dir: PathBuf::from("static"),
      default_locale: Locale::En,
      locale_cookie: "locale".into(),
      cookie_max_age_secs: 31_536_000,
      featured_courses: 3,
    }
  }
}

/// Tunables of the matching-pairs game.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameRules {
  pub min_pairs: usize,
  pub max_pairs: usize,
  pub default_pairs: usize,
  pub match_score: u32,
  pub match_reveal_ms: u64,
  pub mismatch_reveal_ms: u64,
}

impl Default for GameRules {
  fn default() -> Self {
    Self {
      min_pairs: 4,
      max_pairs: 12,
      default_pairs: 8,
      match_score: 10,
      match_reveal_ms: 600,
      mismatch_reveal_ms: 1000,
    }
  }
}

impl SiteConfig {
  /// Parse a TOML document. Missing sections/keys take their defaults.
  pub fn from_toml(s: &str) -> Result<SiteConfig, toml::de::Error> {
    toml::from_str::<SiteConfig>(s)
  }

  /// Defaults, then SITE_CONFIG_PATH, then env overrides.
  pub fn load() -> SiteConfig {
    let mut cfg = load_site_config_from_env().unwrap_or_default();

    if let Ok(dir) = std::env::var("CONTENT_DIR") {
      cfg.site.content_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("STATIC_DIR") {
      cfg.site.static_dir = PathBuf::from(dir);
    }
    if let Ok(code) = std::env::var("DEFAULT_LOCALE") {
      match Locale::from_code(code.trim()) {
        Some(l) => cfg.site.default_locale = l,
        None => warn!(target: "studyhall", %code, "DEFAULT_LOCALE is not a supported locale; keeping configured default"),
      }
    }
    cfg
  }
}

/// Attempt to load `SiteConfig` from SITE_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_site_config_from_env() -> Option<SiteConfig> {
  let path = std::env::var("SITE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match SiteConfig::from_toml(&s) {
      Ok(cfg) => {
        info!(target: "studyhall", %path, "Loaded site config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "studyhall", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "studyhall", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
