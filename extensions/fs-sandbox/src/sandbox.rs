//! Sandbox module for path validation and security
//!
//! A requested path is accepted in two stages:
//!
//! 1. **Lexical**: `~` is expanded, relative paths are anchored at the
//!    startup working directory, `.`/`..` are folded away without touching
//!    the filesystem, and the result must equal an allowed directory or lie
//!    beneath one.
//! 2. **Real**: symbolic links are resolved (for a path that does not exist
//!    yet, through its deepest existing ancestor) and containment is checked
//!    again against the real locations of the allowed directories.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::types::{SandboxError, SandboxResult};

/// Longest path string accepted from a caller, in bytes
pub const MAX_PATH_LEN: usize = 4096;

/// A path proven to lie inside the sandbox
///
/// Only [`Sandbox::resolve`] constructs these. The resolved location may be
/// handed to the filesystem or a child process but never echoed to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    requested: String,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// The caller-supplied string this path was resolved from
    pub fn requested(&self) -> &str {
        &self.requested
    }
}

/// Allowlist of directories operations may touch
#[derive(Debug, Clone)]
pub struct Sandbox {
    /// Absolute, normalized, deduplicated
    allowed: Vec<PathBuf>,
    home_dir: Option<PathBuf>,
    /// Anchor for relative paths, fixed at construction
    base_dir: PathBuf,
}

impl Sandbox {
    /// Create a sandbox for the process's home and working directories
    pub fn new(allowed: &[String]) -> SandboxResult<Self> {
        let base_dir = std::env::current_dir()
            .map_err(|e| SandboxError::Config(format!("working directory: {}", e)))?;
        Self::with_dirs(allowed, dirs::home_dir(), base_dir)
    }

    /// Create a sandbox with explicit home and base directories
    pub fn with_dirs(
        allowed: &[String],
        home_dir: Option<PathBuf>,
        base_dir: PathBuf,
    ) -> SandboxResult<Self> {
        if !base_dir.is_absolute() {
            return Err(SandboxError::Config(
                "base directory must be absolute".to_string(),
            ));
        }

        let mut dirs: Vec<PathBuf> = Vec::with_capacity(allowed.len());
        for entry in allowed {
            let expanded = expand_home(entry, home_dir.as_deref())
                .ok_or_else(|| SandboxError::Config(format!("cannot expand {entry}")))?;
            let normalized = normalize(&base_dir.join(expanded));
            if !dirs.contains(&normalized) {
                dirs.push(normalized);
            }
        }

        if dirs.is_empty() {
            tracing::warn!("No allowed directories configured; every path will be rejected");
        }

        Ok(Self {
            allowed: dirs,
            home_dir,
            base_dir,
        })
    }

    /// Allowed directories in configuration order
    pub fn allowed_dirs(&self) -> &[PathBuf] {
        &self.allowed
    }

    /// Resolve `requested` to a path inside the sandbox
    ///
    /// Fails with `SandboxViolation` when the normalized path is outside
    /// every allowed directory, and with `SymlinkEscape` when it is inside
    /// lexically but a symbolic link leads out.
    pub fn resolve(&self, requested: &str) -> SandboxResult<ResolvedPath> {
        let lexical = self.resolve_lexical(requested)?;

        let real = match real_path(&lexical) {
            Ok(Some(real)) => real,
            Ok(None) => {
                tracing::warn!("dangling symbolic link in requested path");
                return Err(SandboxError::SymlinkEscape(requested.to_string()));
            }
            Err(e) => return Err(SandboxError::from_io(e, requested)),
        };

        let contained = self.allowed.iter().any(|base| match real_path(base) {
            Ok(Some(real_base)) => is_within(&real, &real_base),
            _ => false,
        });

        if !contained {
            tracing::warn!("requested path leaves the sandbox through a symbolic link");
            return Err(SandboxError::SymlinkEscape(requested.to_string()));
        }

        Ok(ResolvedPath {
            path: real,
            requested: requested.to_string(),
        })
    }

    /// Lexical stage of [`resolve`](Self::resolve); no filesystem access
    pub fn resolve_lexical(&self, requested: &str) -> SandboxResult<PathBuf> {
        validate_path_string(requested)?;

        let expanded = expand_home(requested, self.home_dir.as_deref())
            .ok_or_else(|| SandboxError::invalid("path", "home directory is unavailable"))?;
        let normalized = normalize(&self.base_dir.join(expanded));

        if self.allowed.iter().any(|base| is_within(&normalized, base)) {
            Ok(normalized)
        } else {
            Err(SandboxError::SandboxViolation(requested.to_string()))
        }
    }
}

/// Shape checks shared by every path argument
pub fn validate_path_string(path: &str) -> SandboxResult<()> {
    if path.trim().is_empty() {
        return Err(SandboxError::invalid("path", "must not be empty"));
    }
    if path.len() > MAX_PATH_LEN {
        return Err(SandboxError::invalid(
            "path",
            format!("longer than {} bytes", MAX_PATH_LEN),
        ));
    }
    if path.contains('\0') {
        return Err(SandboxError::invalid("path", "contains null byte"));
    }
    Ok(())
}

/// Expand a leading `~` or `~/`; `None` if a home directory is needed but unknown
fn expand_home(path: &str, home_dir: Option<&Path>) -> Option<PathBuf> {
    if path == "~" {
        return home_dir.map(Path::to_path_buf);
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home_dir.map(|home| home.join(rest));
    }
    Some(PathBuf::from(path))
}

/// Fold `.` and `..` out of an absolute path without consulting the filesystem
///
/// `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// `path` equals `base` or lies beneath it
///
/// Comparison is per path component, so `/data` does not contain `/data-evil`.
pub fn is_within(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Real location of `path` after following symbolic links
///
/// Missing trailing components are re-attached to the real location of the
/// deepest existing ancestor. Returns `None` if a component is a dangling
/// symbolic link, whose target cannot be checked.
fn real_path(path: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut existing = path;
    let mut missing: Vec<OsString> = Vec::new();

    loop {
        match std::fs::canonicalize(existing) {
            Ok(mut real) => {
                real.extend(missing.iter().rev());
                return Ok(Some(real));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if std::fs::symlink_metadata(existing).is_ok() {
                    return Ok(None);
                }
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Ok(Some(path.to_path_buf())),
                }
            }
            Err(e) => return Err(e),
        }
    }
}
