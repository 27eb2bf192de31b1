use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::theme::ThemeCode;
use crate::tune::Tune;

pub const ALL_TUNES_FILE: &str = "tunes.json";

pub fn all_tunes_path(out_dir: &Path) -> PathBuf {
    out_dir.join(ALL_TUNES_FILE)
}

pub fn code_path(out_dir: &Path, code: &ThemeCode) -> PathBuf {
    out_dir.join(format!("tunes-{}.json", code))
}

/// A per-code file on disk means that code is done; its contents are not checked.
pub fn is_done(out_dir: &Path, code: &ThemeCode) -> bool {
    code_path(out_dir, code).is_file()
}

/// Replace `path` with the JSON array of `tunes`.
///
/// Writes a sibling `.tmp` file first and renames it over the target, so
/// readers only ever see a complete array.
pub fn write_tunes(path: &Path, tunes: &[Tune]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }

    let json = serde_json::to_string(tunes)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {:?} into place", tmp))?;
    Ok(())
}

pub fn read_tunes(path: &Path) -> Result<Vec<Tune>> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let tunes = serde_json::from_str(&raw).with_context(|| format!("Malformed tune file {:?}", path))?;
    Ok(tunes)
}

pub struct StoreStatus {
    pub codes_done: usize,
    pub tunes: usize,
}

/// Tally the per-code files already written under `out_dir`.
pub fn status(out_dir: &Path) -> Result<StoreStatus> {
    let mut codes_done = 0;
    let mut tunes = 0;
    for code in ThemeCode::all() {
        let path = code_path(out_dir, &code);
        if path.is_file() {
            codes_done += 1;
            tunes += read_tunes(&path)?.len();
        }
    }
    Ok(StoreStatus { codes_done, tunes })
}
