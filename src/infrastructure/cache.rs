use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Logical dataset stored in the cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheFile {
    pub name: &'static str,
    /// Anything smaller is treated as a truncated write from an earlier run.
    pub min_size: u64,
}

impl CacheFile {
    pub const INSTALLED_FORMULAE: CacheFile = CacheFile { name: "installed.json", min_size: 10 };
    pub const INSTALLED_CASKS: CacheFile = CacheFile { name: "installed-casks.json", min_size: 10 };
    pub const FORMULAE: CacheFile = CacheFile { name: "formula.json", min_size: 1000 };
    pub const CASKS: CacheFile = CacheFile { name: "cask.json", min_size: 1000 };
    pub const FORMULA_ANALYTICS: CacheFile = CacheFile { name: "analytics.json", min_size: 100 };
    pub const CASK_ANALYTICS: CacheFile = CacheFile { name: "cask-analytics.json", min_size: 100 };
    pub const TAP_PACKAGES: CacheFile = CacheFile { name: "tap_packages.json", min_size: 10 };
}

/// Per-user blob cache. No TTL: callers decide when to bypass it.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        if !self.dir.exists() {
            tracing::debug!("Creating cache directory {:?}", self.dir);
            fs::create_dir_all(&self.dir)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o750))?;
            }
        }
        Ok(())
    }

    /// Returns the blob only when it exists and holds at least `min_size` bytes.
    pub fn read(&self, name: &str, min_size: u64) -> Option<Vec<u8>> {
        let path = self.path_of(name);
        let metadata = fs::metadata(&path).ok()?;
        if metadata.len() < min_size {
            tracing::debug!(
                "Cache file {} too small ({} < {} bytes), ignoring",
                name,
                metadata.len(),
                min_size
            );
            return None;
        }

        match fs::read(&path) {
            Ok(data) if !data.is_empty() => {
                tracing::trace!("Cache hit for {} ({} bytes)", name, data.len());
                Some(data)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to read cache file {}: {}", name, e);
                None
            }
        }
    }

    pub fn read_file(&self, file: CacheFile) -> Option<Vec<u8>> {
        self.read(file.name, file.min_size)
    }

    pub fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let path = self.path_of(name);
        fs::write(&path, data)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::trace!("Wrote {} bytes to cache file {}", data.len(), name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undersized_file_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache.write("formula.json", b"[]").unwrap();

        assert!(cache.read("formula.json", 1000).is_none());
        assert!(cache.read("missing.json", 0).is_none());
        assert_eq!(cache.read("formula.json", 2).unwrap(), b"[]");
    }

    #[test]
    fn ensure_dir_creates_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().join("a").join("b"));
        cache.ensure_dir().unwrap();
        assert!(cache.dir().is_dir());
        cache.ensure_dir().unwrap();
    }
}
