//! File resolver module for local episode files
//!
//! This module finds video files below a directory by analyzing their content
//! using MIME type detection, and reads season and episode numbers from their
//! filenames.

use regex::Regex;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// `S01E02`, `s1e2`, `S01.E02` and `S01 E02`
static SEASON_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bS([0-9]{1,3})[ ._-]?E([0-9]{1,4})").expect("static regex is valid")
});

/// `1x02` and `01x002`
static CROSS_NUMBERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([0-9]{1,3})x([0-9]{1,4})\b").expect("static regex is valid")
});

/// Errors that can occur during file resolution
#[derive(Debug, Error)]
pub enum FileResolverError {
    /// Path is not a directory
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Failed to read directory
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read directory entry
    #[error("Failed to read directory entry: {0}")]
    ReadEntryFailed(#[from] io::Error),
}

/// Represents a detected video file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    /// Path to the video file
    pub path: PathBuf,
}

/// Investigates a directory recursively to find all video files
///
/// This function scans the given directory and all subdirectories,
/// analyzing each file to detect video files by their content (not extension).
/// Results are sorted by path, so files of a season come out in order.
///
/// # Arguments
///
/// * `dir_path` - The directory path to investigate
///
/// # Returns
///
/// A vector of `VideoFile` structs representing all discovered video files,
/// or an error if the directory cannot be read.
pub fn scan_for_videos(dir_path: &Path) -> Result<Vec<VideoFile>, FileResolverError> {
    let mut video_files = Vec::new();
    scan_directory_recursive(dir_path, &mut video_files)?;
    video_files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(video_files)
}

/// Recursively scans a directory and collects video files
fn scan_directory_recursive(
    dir_path: &Path,
    video_files: &mut Vec<VideoFile>,
) -> Result<(), FileResolverError> {
    if !dir_path.is_dir() {
        return Err(FileResolverError::NotADirectory(dir_path.to_path_buf()));
    }

    for entry in fs::read_dir(dir_path).map_err(|e| FileResolverError::ReadDirectoryFailed {
        path: dir_path.to_path_buf(),
        source: e,
    })? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, video_files)?;
        } else if path.is_file() && is_video_file(&path) {
            video_files.push(VideoFile { path });
        }
    }

    Ok(())
}

/// Analyzes a file to determine if it's a video file
///
/// Returns true if the file is a recognized video format, false otherwise.
/// Only reads the first 8KB of the file.
pub fn is_video_file(file_path: &Path) -> bool {
    const BUFFER_SIZE: usize = 8192;

    let mut file = match File::open(file_path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = vec![0u8; BUFFER_SIZE];
    let bytes_read = match file.read(&mut buffer) {
        Ok(n) => n,
        Err(_) => return false,
    };

    buffer.truncate(bytes_read);

    infer::is_video(&buffer)
}

/// Reads season and episode numbers from a filename
///
/// Understands `S01E02` style and `1x02` style numbering. The first match
/// wins; a name without numbering yields `(None, None)`.
///
/// # Examples
///
/// ```
/// use tvmaze_resolver::parse_episode_numbers;
///
/// assert_eq!(parse_episode_numbers("Show.S02E05.720p.mkv"), (Some(2), Some(5)));
/// assert_eq!(parse_episode_numbers("Show - 3x07 - Title.mkv"), (Some(3), Some(7)));
/// ```
pub fn parse_episode_numbers(file_name: &str) -> (Option<u32>, Option<u32>) {
    SEASON_EPISODE
        .captures(file_name)
        .or_else(|| CROSS_NUMBERING.captures(file_name))
        .map(|captures| (captures[1].parse().ok(), captures[2].parse().ok()))
        .unwrap_or((None, None))
}
