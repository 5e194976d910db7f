//! Machine configuration: video standard (which fixes the CPU clock),
//! ROM location and tracing.  Stored as JSON; unknown fields are
//! rejected, missing fields get defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ── C64 model definitions ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum C64Model {
    #[default]
    PalB,
    NtscM,
    OldNtscM,
    PalN,
    PalM,
}

struct ModelParams {
    color_burst: f64,
    divider: f64,
}

const MODELS: [ModelParams; 5] = [
    ModelParams { color_burst: 4_433_618.75,  divider: 18.0 },
    ModelParams { color_burst: 3_579_545.455, divider: 14.0 },
    ModelParams { color_burst: 3_579_545.455, divider: 14.0 },
    ModelParams { color_burst: 3_582_056.25,  divider: 14.0 },
    ModelParams { color_burst: 3_575_611.49,  divider: 14.0 },
];

impl C64Model {
    /// CPU clock in Hz, derived from the colour-burst crystal.
    pub fn cpu_frequency(self) -> f64 {
        let m = &MODELS[self as usize];
        (m.color_burst * 4.0) / m.divider
    }
}

// ── MachineConfig ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    pub model: C64Model,
    /// Directory holding kernal/basic/chargen images.  `None` uses the
    /// built-in KERNAL stub with empty BASIC and character ROMs.
    pub rom_dir: Option<PathBuf>,
    /// Install a `TraceLogger` on the CPU.
    pub trace: bool,
}

impl MachineConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        log::info!("[c64] Config loaded from {}", path.display());
        Ok(config)
    }

    /// Write the config as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_json()?).map_err(io_err)?;
        log::info!("[c64] Config saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pal_clock() {
        let f = C64Model::PalB.cpu_frequency();
        assert!((f - 985_248.611).abs() < 0.01);
        let f = C64Model::NtscM.cpu_frequency();
        assert!((f - 1_022_727.27).abs() < 0.01);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = MachineConfig::from_json(r#"{ "model": "ntsc_m" }"#).unwrap();
        assert_eq!(config.model, C64Model::NtscM);
        assert_eq!(config.rom_dir, None);
        assert!(!config.trace);
    }

    #[test]
    fn test_json_round_trip() {
        let config = MachineConfig {
            model: C64Model::PalN,
            rom_dir: Some(PathBuf::from("/opt/roms")),
            trace: true,
        };
        let back = MachineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("c64-emu-config-{}", std::process::id()))
            .join("machine.json");
        let config = MachineConfig {
            model: C64Model::NtscM,
            rom_dir: None,
            trace: true,
        };
        config.save(&path).unwrap();
        assert_eq!(MachineConfig::load(&path).unwrap(), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = MachineConfig::load(Path::new("/nonexistent/c64/machine.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = MachineConfig::from_json(r#"{ "modle": "pal_b" }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
