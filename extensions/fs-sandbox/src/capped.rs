//! Size-capped file access
//!
//! Reads compare the file's metadata size against the ceiling before any
//! content is loaded; writes compare the payload length before the
//! filesystem is touched.

use tokio::fs;

use crate::sandbox::ResolvedPath;
use crate::types::{SandboxError, SandboxResult};

/// Read a whole file if it is no larger than `max_bytes`
pub async fn read_capped(path: &ResolvedPath, max_bytes: u64) -> SandboxResult<Vec<u8>> {
    let metadata = fs::metadata(path.as_path())
        .await
        .map_err(|e| SandboxError::from_io(e, path.requested()))?;

    if !metadata.is_file() {
        return Err(SandboxError::invalid("path", "not a regular file"));
    }

    if metadata.len() > max_bytes {
        return Err(SandboxError::FileTooLarge {
            size: metadata.len(),
            max: max_bytes,
        });
    }

    fs::read(path.as_path())
        .await
        .map_err(|e| SandboxError::from_io(e, path.requested()))
}

/// Write `content` if it is no larger than `max_bytes`
///
/// Missing parent directories are created. Returns the number of bytes
/// written.
pub async fn write_capped(
    path: &ResolvedPath,
    content: &[u8],
    max_bytes: u64,
) -> SandboxResult<u64> {
    let size = content.len() as u64;
    if size > max_bytes {
        return Err(SandboxError::FileTooLarge {
            size,
            max: max_bytes,
        });
    }

    if let Some(parent) = path.as_path().parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| SandboxError::from_io(e, path.requested()))?;
    }

    fs::write(path.as_path(), content)
        .await
        .map_err(|e| SandboxError::from_io(e, path.requested()))?;

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Sandbox;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Sandbox) {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(&[dir.path().display().to_string()]).unwrap();
        (dir, sandbox)
    }

    fn resolve(sandbox: &Sandbox, dir: &TempDir, name: &str) -> ResolvedPath {
        sandbox
            .resolve(&dir.path().join(name).display().to_string())
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_exactly_at_limit() {
        let (dir, sandbox) = setup();
        std::fs::write(dir.path().join("f.bin"), vec![7u8; 16]).unwrap();

        let data = read_capped(&resolve(&sandbox, &dir, "f.bin"), 16)
            .await
            .unwrap();
        assert_eq!(data, vec![7u8; 16]);
    }

    #[tokio::test]
    async fn test_read_one_over_limit() {
        let (dir, sandbox) = setup();
        std::fs::write(dir.path().join("f.bin"), vec![7u8; 17]).unwrap();

        let err = read_capped(&resolve(&sandbox, &dir, "f.bin"), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::FileTooLarge { size: 17, max: 16 }));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (dir, sandbox) = setup();
        let err = read_capped(&resolve(&sandbox, &dir, "nope.txt"), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_read_directory_rejected() {
        let (dir, sandbox) = setup();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let err = read_capped(&resolve(&sandbox, &dir, "sub"), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_write_creates_parents() {
        let (dir, sandbox) = setup();
        let path = resolve(&sandbox, &dir, "a/b/c.txt");

        let written = write_capped(&path, b"hello", 16).await.unwrap();
        assert_eq!(written, 5);
        assert_eq!(
            std::fs::read(dir.path().join("a/b/c.txt")).unwrap(),
            b"hello"
        );
    }

    #[tokio::test]
    async fn test_write_over_limit_touches_nothing() {
        let (dir, sandbox) = setup();
        let path = resolve(&sandbox, &dir, "big/file.txt");

        let err = write_capped(&path, &[0u8; 17], 16).await.unwrap_err();
        assert!(matches!(err, SandboxError::FileTooLarge { size: 17, max: 16 }));
        assert!(!dir.path().join("big").exists());
    }
}
