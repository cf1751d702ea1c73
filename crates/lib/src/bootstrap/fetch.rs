//! Archive downloads into the `downloads/` cache.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("fetch failed for {url}: {message}")]
  Request { url: String, message: String },

  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  #[error("io error writing '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Download `url` to `dest`, verifying the SHA256 digest when one is given.
///
/// The body is streamed to `<dest>.part` and renamed into place once the
/// digest checks out, so an interrupted download never looks complete.
pub async fn download(url: &str, expected_sha256: Option<&str>, dest: &Path) -> Result<PathBuf, FetchError> {
  info!(url = %url, dest = %dest.display(), "downloading");

  let io_err = |path: &Path| {
    let path = path.to_path_buf();
    move |source| FetchError::Io { path, source }
  };

  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).await.map_err(io_err(parent))?;
  }

  let request_err = |e: reqwest::Error| FetchError::Request {
    url: url.to_string(),
    message: e.to_string(),
  };

  let mut response = reqwest::get(url).await.map_err(request_err)?;
  if !response.status().is_success() {
    return Err(FetchError::Request {
      url: url.to_string(),
      message: format!("HTTP {}", response.status()),
    });
  }

  let partial = dest.with_extension(match dest.extension() {
    Some(ext) => format!("{}.part", ext.to_string_lossy()),
    None => "part".to_string(),
  });
  let mut file = fs::File::create(&partial).await.map_err(io_err(&partial))?;
  let mut hasher = Sha256::new();
  let mut size = 0usize;

  while let Some(chunk) = response.chunk().await.map_err(request_err)? {
    hasher.update(&chunk);
    size += chunk.len();
    file.write_all(&chunk).await.map_err(io_err(&partial))?;
  }
  file.flush().await.map_err(io_err(&partial))?;
  drop(file);

  let actual = hex::encode(hasher.finalize());
  if let Some(expected) = expected_sha256
    && actual != expected
  {
    let _ = fs::remove_file(&partial).await;
    return Err(FetchError::HashMismatch {
      url: url.to_string(),
      expected: expected.to_string(),
      actual,
    });
  }

  fs::rename(&partial, dest).await.map_err(io_err(dest))?;
  info!(path = %dest.display(), size, "download complete");
  Ok(dest.to_path_buf())
}

/// Check a cached archive against its expected digest.
///
/// Without an expected digest any existing file counts as valid.
pub fn cached_is_valid(path: &Path, expected_sha256: Option<&str>) -> bool {
  let Some(expected) = expected_sha256 else {
    return path.exists();
  };

  match std::fs::read(path) {
    Ok(bytes) => {
      let actual = hex::encode(Sha256::digest(&bytes));
      if actual != expected {
        debug!(path = %path.display(), %expected, %actual, "cached archive hash mismatch");
      }
      actual == expected
    }
    Err(_) => false,
  }
}

/// Convert a URL to a safe file name for the download cache.
///
/// Takes the last path component and sanitizes it. Falls back to a hash of
/// the URL if no usable name remains.
pub fn url_to_filename(url: &str) -> String {
  if let Some(filename) = url.rsplit('/').next() {
    let filename = filename.split('?').next().unwrap_or(filename);

    let sanitized: String = filename
      .chars()
      .map(|c| {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
          c
        } else {
          '_'
        }
      })
      .collect();

    if !sanitized.is_empty() && sanitized != "." && sanitized != ".." {
      return sanitized;
    }
  }

  let digest = hex::encode(Sha256::digest(url.as_bytes()));
  format!("download_{}", &digest[..16])
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn url_to_filename_simple() {
    assert_eq!(url_to_filename("https://example.com/file.tar.gz"), "file.tar.gz");
  }

  #[test]
  fn url_to_filename_with_query() {
    assert_eq!(
      url_to_filename("https://example.com/qooxdoo-3.5-sdk.zip?download=1"),
      "qooxdoo-3.5-sdk.zip"
    );
  }

  #[test]
  fn url_to_filename_sanitizes_special_chars() {
    assert_eq!(url_to_filename("https://example.com/file name.tar.gz"), "file_name.tar.gz");
  }

  #[test]
  fn url_to_filename_fallback_for_empty() {
    assert!(url_to_filename("https://example.com/").starts_with("download_"));
  }

  #[test]
  fn cached_archive_checks_digest() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a.tar.gz");
    std::fs::write(&path, b"hello").unwrap();

    // sha256("hello")
    let good = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    assert!(cached_is_valid(&path, Some(good)));
    assert!(!cached_is_valid(&path, Some("00")));
    assert!(cached_is_valid(&path, None));
    assert!(!cached_is_valid(&temp.path().join("missing"), None));
  }

  #[tokio::test]
  async fn unreachable_host_is_a_request_error() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("x.tar.gz");
    let result = download("http://127.0.0.1:9/x.tar.gz", None, &dest).await;
    assert!(matches!(result, Err(FetchError::Request { .. })));
    assert!(!dest.exists());
  }

  // sha256("hello")
  const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

  #[tokio::test]
  async fn download_streams_into_place() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/dep-1.0.tar.gz")
      .with_status(200)
      .with_body("hello")
      .create_async()
      .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("downloads/dep-1.0.tar.gz");
    let url = format!("{}/dep-1.0.tar.gz", server.url());

    let path = download(&url, Some(HELLO_SHA256), &dest).await.unwrap();

    mock.assert_async().await;
    assert_eq!(path, dest);
    assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    assert!(!temp.path().join("downloads/dep-1.0.tar.gz.part").exists());
    assert!(cached_is_valid(&dest, Some(HELLO_SHA256)));
  }

  #[tokio::test]
  async fn hash_mismatch_removes_partial_file() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/dep-1.0.tar.gz")
      .with_status(200)
      .with_body("tampered")
      .create_async()
      .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("dep-1.0.tar.gz");
    let url = format!("{}/dep-1.0.tar.gz", server.url());

    let err = download(&url, Some(HELLO_SHA256), &dest).await.unwrap_err();

    assert!(matches!(&err, FetchError::HashMismatch { expected, .. } if expected == HELLO_SHA256));
    assert!(!dest.exists());
    assert!(!temp.path().join("dep-1.0.tar.gz.part").exists());
  }

  #[tokio::test]
  async fn error_status_is_a_request_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("GET", "/missing.zip").with_status(404).create_async().await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("missing.zip");
    let url = format!("{}/missing.zip", server.url());

    let err = download(&url, None, &dest).await.unwrap_err();

    assert!(matches!(&err, FetchError::Request { message, .. } if message.contains("404")));
    assert!(!dest.exists());
  }
}
