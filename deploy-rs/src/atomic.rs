use eyre::{eyre, Result};
use std::{fs, path::Path};

/// Writes `contents` to a sibling temp file, then renames it over `path`.
///
/// Readers see either the previous file or the complete new one, never a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| eyre!("failed to create directory {}: {e}", parent.display()))?;
        }
    }

    let tmp_path = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    };
    if let Err(e) = fs::write(&tmp_path, contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(eyre!(
            "failed to write temp file {}: {e}",
            tmp_path.display()
        ));
    }

    // On Windows, rename fails if the destination exists; in that case we remove then rename.
    if let Err(err) = fs::rename(&tmp_path, path) {
        if cfg!(windows) {
            let _ = fs::remove_file(path);
            if let Err(e) = fs::rename(&tmp_path, path) {
                let _ = fs::remove_file(&tmp_path);
                return Err(eyre!("failed to replace {}: {e}", path.display()));
            }
        } else {
            let _ = fs::remove_file(&tmp_path);
            return Err(eyre!("failed to replace {}: {err}", path.display()));
        }
    }
    Ok(())
}
