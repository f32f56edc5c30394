use std::fs::File;
use std::path::Path;

use blake3::Hasher;
use memmap2::Mmap;

use crate::error::{HerdError, Result};

/// Computes the BLAKE3 hash of a file's contents.
///
/// The file is memory-mapped rather than read into a buffer, so peak memory
/// stays bounded regardless of file size, and BLAKE3's rayon-backed update
/// is used on the mapped bytes. Symlinks and directories are rejected:
/// digest keys must correspond to regular proto files.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or mapped, or if the path
/// is not a regular file.
pub fn hash_file(path: &Path) -> Result<String> {
    let metadata = std::fs::symlink_metadata(path).map_err(|source| HerdError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    if metadata.is_symlink() {
        return Err(HerdError::InvalidFileType {
            path: path.to_path_buf(),
            message: "symbolic links are not tracked".to_string(),
        });
    }

    if metadata.is_dir() {
        return Err(HerdError::InvalidFileType {
            path: path.to_path_buf(),
            message: "directories cannot be hashed".to_string(),
        });
    }

    // Mapping a zero-length file fails on some platforms.
    if metadata.len() == 0 {
        return Ok(Hasher::new().finalize().to_hex().to_string());
    }

    let file = File::open(path).map_err(|source| HerdError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| HerdError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Hasher::new();
    hasher.update_rayon(&mmap);

    Ok(hasher.finalize().to_hex().to_string())
}

/// Computes the BLAKE3 hash of an in-memory byte slice.
///
/// Used for the configuration fingerprint, where the whole document has
/// already been read and any byte-level change must alter the result.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_hash_file_is_content_addressed() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.proto");
        let b = temp_dir.path().join("b.proto");
        fs::write(&a, "syntax = \"proto3\";").unwrap();
        fs::write(&b, "syntax = \"proto3\";").unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());

        fs::write(&b, "syntax = \"proto2\";").unwrap();
        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_hash_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("empty.proto");
        fs::write(&empty, "").unwrap();

        // BLAKE3 hash of the empty input
        assert_eq!(
            hash_file(&empty).unwrap(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_hash_nonexistent_file() {
        let result = hash_file(Path::new("/nonexistent/file.proto"));
        assert!(matches!(result, Err(HerdError::IoError { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_hash_symlink_rejected() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.proto");
        let link = temp_dir.path().join("link.proto");
        fs::write(&target, "message M {}").unwrap();
        symlink(&target, &link).unwrap();

        let result = hash_file(&link);
        assert!(matches!(result, Err(HerdError::InvalidFileType { .. })));
    }

    #[test]
    fn test_hash_bytes_differs_on_whitespace() {
        assert_ne!(hash_bytes(b"force = true"), hash_bytes(b"force = true "));
    }
}
