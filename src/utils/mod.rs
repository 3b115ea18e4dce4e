//! Utility functions for locating source extracts and reporting progress

pub mod logging;

use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::error::{Result, SurveyError};

pub use logging::{log_operation_complete, log_operation_start, log_warning};

/// Kind of tabular source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma separated values with a header row
    Csv,
    /// Apache Parquet
    Parquet,
}

impl SourceFormat {
    /// Detect the format from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Validates that a directory exists and is a directory
///
/// # Errors
/// Returns a source read error if the directory does not exist or is not a directory
pub fn validate_directory(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Err(SurveyError::source_read(dir, "Directory does not exist"));
    }
    if !dir.is_dir() {
        return Err(SurveyError::source_read(dir, "Path is not a directory"));
    }
    Ok(())
}

/// Find all source extracts in a directory
///
/// Files are returned in lexicographic path order so that "first encountered"
/// is stable across runs. Files of other types are skipped with a warning.
///
/// # Errors
/// Returns an error if directory reading fails
pub fn find_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    log_operation_start("Searching for source extracts in", dir);
    validate_directory(dir)?;

    let entries = std::fs::read_dir(dir)
        .map_err(|e| SurveyError::source_read(dir, format!("Failed to read directory: {e}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| {
                SurveyError::source_read(dir, format!("Failed to read directory entry: {e}"))
            })?
            .path();
        if !path.is_file() {
            continue;
        }
        if SourceFormat::from_path(&path).is_some() {
            files.push(path);
        } else {
            log_warning("Skipping file with unsupported extension", Some(&path));
        }
    }

    let files = files.into_iter().sorted().collect_vec();
    if files.is_empty() {
        log_warning("No source extracts found in directory", Some(dir));
    } else {
        log_operation_complete("found", dir, files.len(), None);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_case_insensitively() {
        assert_eq!(SourceFormat::from_path(Path::new("cps_2019.CSV")), Some(SourceFormat::Csv));
        assert_eq!(
            SourceFormat::from_path(Path::new("cps_2020.parquet")),
            Some(SourceFormat::Parquet)
        );
        assert_eq!(SourceFormat::from_path(Path::new("cps_2020.zip")), None);
        assert_eq!(SourceFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn lists_extracts_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["dec20pub.csv", "dec19pub.csv", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let files = find_source_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["dec19pub.csv", "dec20pub.csv"]);
    }

    #[test]
    fn missing_directory_is_a_source_error() {
        let err = validate_directory(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SurveyError::SourceRead { .. }));
    }
}
