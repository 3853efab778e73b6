//! Pool configuration.
//!
//! Settings for the resource registry and the object pool, loaded from an INI
//! file. Missing keys keep their defaults.
//!
//! # Configuration File Format
//!
//! ```ini
//! [resources]
//! loading_log = true
//! image_scale = 1.0
//!
//! [objects]
//! multi_world = false
//! bound_left = -100
//! bound_right = 100
//! bound_bottom = -100
//! bound_top = 100
//!
//! [script]
//! main = ./assets/scripts/main.lua
//! ```

use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::objectpool::ObjectPoolSettings;
use crate::resources::objectpool::WorldBound;
use crate::resources::registry::DEFAULT_IMAGE_SCALE;

const DEFAULT_CONFIG_PATH: &str = "./config.ini";
const DEFAULT_MAIN_SCRIPT: &str = "./assets/scripts/main.lua";

#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Log every resource load.
    pub loading_log: bool,
    /// Global image scale factor applied by loaders.
    pub image_scale: f32,
    /// Enable world masks on the object pool.
    pub multi_world: bool,
    /// Initial object pool world bound.
    pub bound: WorldBound,
    /// Entry script run at startup.
    pub main_script: PathBuf,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self {
            loading_log: cfg!(debug_assertions),
            image_scale: DEFAULT_IMAGE_SCALE,
            multi_world: false,
            bound: WorldBound::default(),
            main_script: PathBuf::from(DEFAULT_MAIN_SCRIPT),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file at `config_path`.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [resources] section
        if let Some(flag) = config.getbool("resources", "loading_log").ok().flatten() {
            self.loading_log = flag;
        }
        if let Some(scale) = config.getfloat("resources", "image_scale").ok().flatten() {
            self.image_scale = scale as f32;
        }

        // [objects] section
        if let Some(flag) = config.getbool("objects", "multi_world").ok().flatten() {
            self.multi_world = flag;
        }
        if let Some(v) = config.getfloat("objects", "bound_left").ok().flatten() {
            self.bound.left = v;
        }
        if let Some(v) = config.getfloat("objects", "bound_right").ok().flatten() {
            self.bound.right = v;
        }
        if let Some(v) = config.getfloat("objects", "bound_bottom").ok().flatten() {
            self.bound.bottom = v;
        }
        if let Some(v) = config.getfloat("objects", "bound_top").ok().flatten() {
            self.bound.top = v;
        }

        // [script] section
        if let Some(main) = config.get("script", "main") {
            self.main_script = PathBuf::from(main);
        }

        info!(
            "Loaded config: loading_log={}, image_scale={}, multi_world={}, bound={:?}, main={}",
            self.loading_log,
            self.image_scale,
            self.multi_world,
            self.bound.as_tuple(),
            self.main_script.display()
        );
    }

    /// Save configuration to the INI file at `config_path`.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("resources", "loading_log", Some(self.loading_log.to_string()));
        config.set("resources", "image_scale", Some(self.image_scale.to_string()));

        config.set("objects", "multi_world", Some(self.multi_world.to_string()));
        config.set("objects", "bound_left", Some(self.bound.left.to_string()));
        config.set("objects", "bound_right", Some(self.bound.right.to_string()));
        config.set("objects", "bound_bottom", Some(self.bound.bottom.to_string()));
        config.set("objects", "bound_top", Some(self.bound.top.to_string()));

        config.set(
            "script",
            "main",
            Some(self.main_script.to_string_lossy().into_owned()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {}", self.config_path.display());
        Ok(())
    }

    pub fn object_pool_settings(&self) -> ObjectPoolSettings {
        ObjectPoolSettings {
            multi_world: self.multi_world,
            bound: self.bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_keep_defaults() {
        let mut config = PoolConfig::new();
        config
            .load_from_str("[objects]\nmulti_world = true\nbound_top = 256\n")
            .unwrap();
        assert!(config.multi_world);
        assert_eq!(config.bound.top, 256.0);
        assert_eq!(config.bound.left, -100.0);
        assert_eq!(config.image_scale, DEFAULT_IMAGE_SCALE);
    }

    #[test]
    fn test_full_config() {
        let mut config = PoolConfig::new();
        config
            .load_from_str(
                "[resources]\nloading_log = false\nimage_scale = 2.5\n\
                 [objects]\nbound_left = -224\nbound_right = 224\nbound_bottom = -256\nbound_top = 256\n\
                 [script]\nmain = game/main.lua\n",
            )
            .unwrap();
        assert!(!config.loading_log);
        assert_eq!(config.image_scale, 2.5);
        assert_eq!(config.bound.as_tuple(), (-224.0, 224.0, -256.0, 256.0));
        assert_eq!(config.main_script, PathBuf::from("game/main.lua"));
        let settings = config.object_pool_settings();
        assert!(!settings.multi_world);
        assert_eq!(settings.bound, config.bound);
    }

    #[test]
    fn test_missing_file_is_error() {
        let mut config = PoolConfig::with_path("/nonexistent/stagepool.ini");
        assert!(config.load_from_file().is_err());
    }
}
