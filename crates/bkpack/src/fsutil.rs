use std::fs;
use std::io;
use std::path::Path;

/// Deletes every file and symlink below `dir`, keeping the directory tree.
///
/// Entries that cannot be removed are logged and skipped.
pub fn clear_dir(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let result = entry.file_type().and_then(|ty| {
            if ty.is_dir() {
                clear_dir(&path)
            } else {
                fs::remove_file(&path)
            }
        });
        if let Err(e) = result {
            tracing::warn!("Failed to delete {}: {}", path.display(), e);
        }
    }
    Ok(())
}

/// Copies the regular files directly inside `src` into `dst`, creating
/// `dst` if needed. Subdirectories are not descended into.
pub fn copy_files(src: &Path, dst: &Path) -> io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name() {
            fs::copy(&path, dst.join(name))?;
            copied += 1;
        }
    }
    tracing::info!("copied {} files from {} to {}", copied, src.display(), dst.display());
    Ok(copied)
}
