//! Runtime configuration.
//!
//! The main knob is the API origin; the scene variant and the editor switch sit beside it.
//! Natively they are read from the process environment; on the web there is no
//! environment at runtime, so the values are baked in at compile time the same
//! way a bundler would inline them.

use crate::scene::params::SceneVariant;

pub const API_URL_VAR: &str = "BLOG_API_URL";
pub const SCENE_VAR: &str = "BLOG_SCENE";
pub const EDITOR_VAR: &str = "BLOG_EDITOR";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the posts API, without a trailing slash.
    pub api_url: String,
    /// Which iteration of the city backdrop to mount on the home page.
    pub scene: SceneVariant,
    /// Exposes `/posts/new` and the matching nav link.
    pub editor_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            scene: SceneVariant::default(),
            editor_enabled: true,
        }
    }
}

impl Config {
    /// Reads the configuration from the environment of the current platform.
    pub fn from_env() -> Self {
        Self::from_lookup(lookup)
    }

    /// Builds a configuration from any key lookup. Missing keys keep their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(url) = get(API_URL_VAR).filter(|url| !url.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(scene) = get(SCENE_VAR) {
            match scene.parse::<SceneVariant>() {
                Ok(variant) => config.scene = variant,
                Err(e) => log::warn!("{}; using the {:?} scene", e, config.scene),
            }
        }
        if let Some(editor) = get(EDITOR_VAR) {
            config.editor_enabled = !matches!(
                editor.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        config
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(target_arch = "wasm32")]
fn lookup(key: &str) -> Option<String> {
    let value = match key {
        API_URL_VAR => option_env!("BLOG_API_URL"),
        SCENE_VAR => option_env!("BLOG_SCENE"),
        EDITOR_VAR => option_env!("BLOG_EDITOR"),
        _ => None,
    };
    value.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_of(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(config_of(&[]), Config::default());
    }

    #[test]
    fn trims_trailing_slashes_from_api_url() {
        let config = config_of(&[(API_URL_VAR, "https://api.example.com/v1//")]);
        assert_eq!(config.api_url, "https://api.example.com/v1");
    }

    #[test]
    fn unknown_scene_keeps_default() {
        let config = config_of(&[(SCENE_VAR, "vaporwave")]);
        assert_eq!(config.scene, SceneVariant::default());
    }

    #[test]
    fn editor_can_be_switched_off() {
        assert!(!config_of(&[(EDITOR_VAR, "false")]).editor_enabled);
        assert!(!config_of(&[(EDITOR_VAR, "0")]).editor_enabled);
        assert!(config_of(&[(EDITOR_VAR, "1")]).editor_enabled);
    }

    #[test]
    fn picks_pixel_scene() {
        assert_eq!(config_of(&[(SCENE_VAR, "Pixel")]).scene, SceneVariant::Pixel);
    }
}
