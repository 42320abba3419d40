//! Level configuration and the external config provider
//!
//! A level config is generated by an outside text-to-config service. The
//! service is slow and unreliable, so every failure lands on the default
//! config instead of reaching the caller.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RGBA display color, serialized as `#rrggbb` / `#rrggbbaa`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional)
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => {
                let nib = |i: usize| {
                    let v = u8::from_str_radix(hex.get(i..i + 1)?, 16).ok()?;
                    Some(v * 17)
                };
                Some(Color::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?).with_alpha(byte(6)?)),
            _ => None,
        }
    }

    /// CSS color string (`#rrggbb`, or `rgba(..)` when translucent)
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color `{value}`"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Immutable per-match level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelConfig {
    pub theme_name: String,
    pub mission_text: String,
    pub background_color: Color,
    pub wall_color: Color,
    pub player_color: Color,
    pub enemy_color: Color,
    /// Enemy pursuit speed (px/frame)
    pub enemy_speed: f32,
    /// Milliseconds between enemy spawns
    pub enemy_spawn_rate_ms: f64,
    /// Player move speed (px/frame)
    pub player_speed: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            theme_name: "Erindale Park".to_string(),
            mission_text: "Survive the night. Keep your light on them.".to_string(),
            background_color: Color::rgb(0x1b, 0x26, 0x1a),
            wall_color: Color::rgb(0x55, 0x5b, 0x63),
            player_color: Color::rgb(0x4f, 0xc3, 0xf7),
            enemy_color: Color::rgb(0xe5, 0x39, 0x35),
            enemy_speed: 2.0,
            enemy_spawn_rate_ms: 1500.0,
            player_speed: 4.0,
        }
    }
}

impl LevelConfig {
    /// Clamp numeric fields into playable ranges; non-finite values take the default
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.enemy_speed = finite_or(self.enemy_speed, defaults.enemy_speed).clamp(0.5, 10.0);
        self.player_speed = finite_or(self.player_speed, defaults.player_speed).clamp(1.0, 12.0);
        self.enemy_spawn_rate_ms = if self.enemy_spawn_rate_ms.is_finite() {
            self.enemy_spawn_rate_ms.clamp(200.0, 10_000.0)
        } else {
            defaults.enemy_spawn_rate_ms
        };
        if self.theme_name.trim().is_empty() {
            self.theme_name = defaults.theme_name;
        }
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Config provider failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no credential configured for the config service")]
    MissingCredential,
    #[error("config service failed: {0}")]
    Provider(String),
    #[error("response contained no JSON object")]
    NoJson,
    #[error("malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// External text-to-config service
///
/// Returns the raw service response; parsing happens in [`generate_config`].
pub trait ConfigProvider {
    fn request(&self, prompt: &str) -> impl Future<Output = Result<String, ConfigError>>;
}

/// Provider used when no service credential is available
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineProvider;

impl ConfigProvider for OfflineProvider {
    async fn request(&self, _prompt: &str) -> Result<String, ConfigError> {
        Err(ConfigError::MissingCredential)
    }
}

/// Wrap a player's free-text level idea in instructions for the service
pub fn build_prompt(idea: &str) -> String {
    format!(
        "Design a level for a top-down arena shooter based on: \"{}\". \
         Respond with a single JSON object with keys themeName, missionText, \
         backgroundColor, wallColor, playerColor, enemyColor (hex colors), \
         enemySpeed (0.5-10), enemySpawnRateMs (200-10000), playerSpeed (1-12).",
        idea.trim()
    )
}

/// Parse a service response that may wrap the JSON object in prose or fences
pub fn parse_config_response(text: &str) -> Result<LevelConfig, ConfigError> {
    let start = text.find('{').ok_or(ConfigError::NoJson)?;
    let end = text.rfind('}').ok_or(ConfigError::NoJson)?;
    if end < start {
        return Err(ConfigError::NoJson);
    }
    let config: LevelConfig = serde_json::from_str(&text[start..=end])?;
    Ok(config.sanitized())
}

/// Ask the provider for a config, falling back to the default on any failure
pub async fn generate_config<P: ConfigProvider>(provider: &P, idea: &str) -> LevelConfig {
    let prompt = build_prompt(idea);
    match provider.request(&prompt).await {
        Ok(text) => match parse_config_response(&text) {
            Ok(config) => {
                log::info!("Generated level config: {}", config.theme_name);
                config
            }
            Err(e) => {
                log::warn!("Config response unusable ({e}), using default level");
                LevelConfig::default()
            }
        },
        Err(e) => {
            log::warn!("Config generation failed ({e}), using default level");
            LevelConfig::default()
        }
    }
}
