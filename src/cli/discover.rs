//! Finding scenario files on disk

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::common::{Error, Result};

/// Expand `paths` into a sorted, de-duplicated list of scenario files.
///
/// Files are taken as given. Directories are searched recursively for
/// files with one of `extensions`. Symlinked directories are not entered.
pub fn scenario_files(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            walk(path, extensions, &mut found)?;
            found.sort();
            files.extend(found);
        } else if path.exists() {
            files.push(path.clone());
        } else {
            return Err(Error::FileRead {
                path: path.display().to_string(),
                error: "no such file or directory".to_string(),
            });
        }
    }
    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
    Ok(files)
}

fn walk(dir: &Path, extensions: &[String], found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| Error::FileRead {
            path: e.path().unwrap_or(dir).display().to_string(),
            error: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_file() && has_extension(path, extensions) {
            found.push(path.to_path_buf());
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}
