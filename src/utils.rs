//! Utility functions for cross-platform path handling

use std::path::{Path, PathBuf};

/// Resolve a repository URL to a local directory, if it names one
///
/// Accepts `file://` URLs, absolute paths (Unix, Windows drive letters and UNC
/// shares) and `./` or `../` relative paths. Everything else (`https://`,
/// `http://`, bare names) is treated as remote.
pub fn local_repository_path(url: &str) -> Option<PathBuf> {
  if let Some(rest) = url.strip_prefix("file://") {
    return (!rest.is_empty()).then(|| PathBuf::from(rest));
  }

  if url.contains("://") {
    return None;
  }

  if url.starts_with("./") || url.starts_with("../") || url.starts_with("\\\\") {
    return Some(PathBuf::from(url));
  }

  // Drive letter, checked before is_absolute() so it also holds on Unix hosts
  let bytes = url.as_bytes();
  if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/')
  {
    return Some(PathBuf::from(url));
  }

  if url.starts_with('/') || Path::new(url).is_absolute() {
    return Some(PathBuf::from(url));
  }

  None
}

/// Render a path with forward slashes regardless of platform
///
/// Used for project-relative locations in reports and for suppression globs.
pub fn path_to_slash(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
