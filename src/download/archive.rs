use std::{fs, path::{Path, PathBuf}};

use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Extracts the given `.zip` file to the target directory.
/// If `delete_after` is `true`, removes the `.zip` file after a successful extraction.
pub fn extract_zip(zip_path: &Path, dest_dir: &Path, delete_after: bool) -> Result<()> {
    let file = fs::File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(dest_dir)?;
    archive.extract(dest_dir)?;

    if delete_after {
        fs::remove_file(zip_path)?;
    }
    Ok(())
}

/// Find the first `.shp` file below `dir` (in sorted path order).
pub fn find_shapefile(dir: &Path) -> Result<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .find(|path| path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("shp")))
        .ok_or_else(|| Error::SourceNotFound(dir.to_path_buf()))
}
