//! ROM image loader.
//!
//! Both `.bin` and `.rom` extensions are accepted (`.bin` tried first).
//!
//! # Search paths (tried in order)
//! 1. `$C64_ROM_DIR`
//! 2. `./roms/` and `./` in the working directory
//! 3. `roms/` and the directory next to the executable
//! 4. `~/.local/share/c64/roms/`
//! 5. `/usr/share/vice/C64/` and `/usr/local/share/vice/C64/`

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::banks::system_rom::{BASIC_SIZE, CHARGEN_SIZE, KERNAL_SIZE};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomSet {
    pub kernal: Vec<u8>,
    pub basic: Vec<u8>,
    pub chargen: Vec<u8>,
}

impl RomSet {
    /// Search the standard paths and load all three ROM images.
    pub fn load() -> Result<Self> {
        let dir = find_rom_dir()?;
        Self::load_from(&dir)
    }

    /// Load all three ROM images from an explicit directory.
    pub fn load_from<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            kernal: load_rom(dir, "kernal", KERNAL_SIZE)?,
            basic: load_rom(dir, "basic", BASIC_SIZE)?,
            chargen: load_rom(dir, "chargen", CHARGEN_SIZE)?,
        })
    }
}

// ── Internal helpers ──────────────────────────────────────────

fn candidate_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(val) = env::var_os("C64_ROM_DIR") {
        candidates.push(PathBuf::from(val));
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join("roms"));
        candidates.push(cwd);
    }
    if let Ok(exe) = env::current_exe() {
        if let Some(d) = exe.parent() {
            candidates.push(d.join("roms"));
            candidates.push(d.to_path_buf());
        }
    }
    if let Some(home) = dirs_home() {
        candidates.push(home.join(".local").join("share").join("c64").join("roms"));
    }
    candidates.push(PathBuf::from("/usr/share/vice/C64"));
    candidates.push(PathBuf::from("/usr/local/share/vice/C64"));
    candidates
}

fn find_rom_dir() -> Result<PathBuf> {
    let searched = candidate_dirs();
    match searched.iter().find(|dir| has_all_roms(dir)) {
        Some(dir) => Ok(dir.clone()),
        None => Err(Error::RomNotFound { searched }),
    }
}

/// True when all three ROMs exist (either .bin or .rom).
fn has_all_roms(dir: &Path) -> bool {
    ["kernal", "basic", "chargen"]
        .iter()
        .all(|base| rom_path(dir, base).is_some())
}

fn rom_path(dir: &Path, base: &str) -> Option<PathBuf> {
    ["bin", "rom"]
        .iter()
        .map(|ext| dir.join(format!("{base}.{ext}")))
        .find(|p| p.is_file())
}

/// Read a ROM file.  Images must have exactly the chip's size.
fn load_rom(dir: &Path, base: &'static str, expected: usize) -> Result<Vec<u8>> {
    let path = rom_path(dir, base).ok_or_else(|| Error::RomNotFound {
        searched: vec![dir.to_path_buf()],
    })?;

    let data = fs::read(&path).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;

    if data.len() != expected {
        return Err(Error::RomSize {
            name: base,
            expected,
            actual: data.len(),
        });
    }

    log::info!("[c64] Loaded ROM: {}", path.display());
    Ok(data)
}

fn dirs_home() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
}
