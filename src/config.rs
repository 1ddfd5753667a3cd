use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::engine::EngineConfig;
use crate::input;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub surface_width: f32,
    pub surface_height: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device: None,
            surface_width: 1920.0,
            surface_height: 1080.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub input: InputConfig,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(text)?;
        validate_config(&cfg)?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        Self::parse(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
    }
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigState {
    pub config: Config,
    pub path: PathBuf,
}

pub fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("gesturectl"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn default_config_text() -> &'static str {
    include_str!("../config/default.toml")
}

impl ConfigState {
    pub fn load_or_install_default() -> Result<Self> {
        let path = default_config_path()?;
        if !path.exists() {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&path, default_config_text())?;
            info!("installed default config at {}", path.display());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        let config = Config::load(&path)?;
        Ok(Self { config, path })
    }

    /// Re-reads the file; on error the last good config stays in place.
    pub fn reload(&mut self) -> Result<()> {
        self.config = Config::load(&self.path)?;
        Ok(())
    }

    pub fn doctor_report(&self) -> serde_json::Value {
        let devices: Vec<String> = input::discover_multitouch()
            .into_iter()
            .map(|d| format!("{} ({})", d.name, d.path))
            .collect();
        serde_json::json!({
            "config": self.path,
            "input_group_member": check_in_input_group(),
            "devices": devices,
            "hints": {
                "add_user_to_input_group": "sudo usermod -aG input $USER && newgrp input"
            }
        })
    }
}

fn validate_config(c: &Config) -> Result<()> {
    let e = &c.engine;
    if !(e.swipe_threshold_px.is_finite() && e.swipe_threshold_px > 0.0) {
        return Err(anyhow!("engine.swipe_threshold_px must be a positive number"));
    }
    if let Some(b) = e.drag_bounds {
        if ![b.left, b.top, b.right, b.bottom].iter().all(|v| v.is_finite()) {
            return Err(anyhow!("engine.drag_bounds must be finite"));
        }
        if b.right < b.left || b.bottom < b.top {
            return Err(anyhow!(
                "engine.drag_bounds must satisfy left <= right and top <= bottom"
            ));
        }
    }
    if let Some(x) = e.drag_extent {
        if !(x.width.is_finite() && x.height.is_finite()) || x.width < 0.0 || x.height < 0.0 {
            return Err(anyhow!("engine.drag_extent must be non-negative"));
        }
    }
    if e.drag_bounds.is_some() != e.drag_extent.is_some() {
        warn!("drag clamp needs both engine.drag_bounds and engine.drag_extent; ignoring");
    }

    let i = &c.input;
    if !(i.surface_width > 0.0 && i.surface_height > 0.0) {
        return Err(anyhow!("input.surface_width/height must be positive"));
    }
    if let Some(dev) = &i.device {
        if dev.trim().is_empty() {
            return Err(anyhow!("input.device must not be empty"));
        }
    }
    Ok(())
}

fn check_in_input_group() -> bool {
    if let Ok(s) = fs::read_to_string("/etc/group") {
        let user = whoami::username();
        for line in s.lines() {
            if line.starts_with("input:")
                && line
                    .split(':')
                    .nth(3)
                    .unwrap_or("")
                    .split(',')
                    .any(|u| u == user)
            {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::{Extent, Rect};

    #[test]
    fn embedded_default_parses() {
        let cfg = Config::parse(default_config_text()).unwrap();
        assert_eq!(cfg.engine, EngineConfig::default());
        assert_eq!(cfg.input.device, None);
        assert_eq!(cfg.input.surface_width, 1920.0);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn drag_clamp_tables() {
        let cfg = Config::parse(
            r#"
            [engine]
            swipe_threshold_px = 24.0
            continuous_swipe_feedback = true
            drag_bounds = { left = 0.0, top = 0.0, right = 200.0, bottom = 200.0 }
            drag_extent = { width = 50.0, height = 50.0 }
            "#,
        )
        .unwrap();
        assert_eq!(cfg.engine.swipe_threshold_px, 24.0);
        assert!(cfg.engine.continuous_swipe_feedback);
        let c = cfg.engine.drag_constraint().unwrap();
        assert_eq!(
            c.bounds,
            Rect {
                left: 0.0,
                top: 0.0,
                right: 200.0,
                bottom: 200.0
            }
        );
        assert_eq!(
            c.extent,
            Extent {
                width: 50.0,
                height: 50.0
            }
        );
    }

    #[test]
    fn bounds_without_extent_is_not_a_constraint() {
        let cfg = Config::parse(
            "[engine]\ndrag_bounds = { left = 0.0, top = 0.0, right = 10.0, bottom = 10.0 }\n",
        )
        .unwrap();
        assert!(cfg.engine.drag_constraint().is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::parse("[engine]\nswipe_threshold_px = 0.0\n").is_err());
        assert!(Config::parse("[engine]\nswipe_threshold_px = -3.0\n").is_err());
        assert!(
            Config::parse(
                "[engine]\ndrag_bounds = { left = 10.0, top = 0.0, right = 0.0, bottom = 10.0 }\n"
            )
            .is_err()
        );
        assert!(
            Config::parse("[engine]\ndrag_extent = { width = -1.0, height = 5.0 }\n").is_err()
        );
        assert!(Config::parse("[input]\nsurface_width = 0.0\n").is_err());
        assert!(Config::parse("[input]\ndevice = \"  \"\n").is_err());
        assert!(Config::parse("[engine]\nswipe_threshold_px = \"far\"\n").is_err());
    }

    #[test]
    fn load_reports_path_on_failure() {
        let dir = std::env::temp_dir().join(format!("gesturectl-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        fs::write(&path, "[engine\n").unwrap();
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("broken.toml"), "{err}");

        fs::write(&path, "[engine]\nswipe_threshold_px = 15.0\n").unwrap();
        let mut st = ConfigState::load_from(path.clone()).unwrap();
        assert_eq!(st.config.engine.swipe_threshold_px, 15.0);

        fs::write(&path, "[engine]\nswipe_threshold_px = 0.0\n").unwrap();
        assert!(st.reload().is_err());
        assert_eq!(st.config.engine.swipe_threshold_px, 15.0);
        let _ = fs::remove_dir_all(&dir);
    }
}
