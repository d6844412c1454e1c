//! Read-through cache of file contents.
//!
//! [`FileCache`] keeps the bytes of recently read files, keyed by path, over an
//! LRU or LFU core. The core is bounded by bytes rather than by file count:
//! it weighs each file by its length and evicts in policy order once the
//! bytes held, plus the file being added, would exceed `max_size`. Files
//! larger than `max_file_size`, or larger than the whole budget, are read but
//! never stored.

use crate::core::CacheCore;
use crate::error::Result;
use crate::policy::{EvictionPolicy, Lfu, Lru};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

type Bytes = Arc<[u8]>;

fn byte_len(bytes: &Bytes) -> usize {
    bytes.len()
}

/// File content cache.
///
/// ```no_run
/// use hoard::FileCache;
/// use std::time::Duration;
///
/// let cache = FileCache::lru(8 << 20, 1 << 20, Duration::from_secs(300));
/// let bytes = cache.get_file_bytes("templates/index.html")?;
/// println!("{} bytes, {} of {} cached", bytes.len(), cache.used_size(), cache.max_size());
/// # Ok::<(), hoard::Error>(())
/// ```
pub struct FileCache<P = Lru> {
    cache: CacheCore<PathBuf, Bytes, P>,
    max_file_size: usize,
}

impl FileCache<Lru> {
    /// File cache evicting the least recently read file.
    ///
    /// `max_size` is the byte budget of the whole cache (`0` for no limit),
    /// `max_file_size` the largest file in bytes that is cached (`0` for no
    /// limit), `timeout` the TTL of each cached file (zero for none).
    pub fn lru(max_size: usize, max_file_size: usize, timeout: Duration) -> Self {
        Self::with_policy(Lru, max_size, max_file_size, timeout)
    }
}

impl FileCache<Lfu> {
    /// File cache evicting the least frequently read files.
    pub fn lfu(max_size: usize, max_file_size: usize, timeout: Duration) -> Self {
        Self::with_policy(Lfu, max_size, max_file_size, timeout)
    }
}

impl<P: EvictionPolicy<PathBuf, Bytes>> FileCache<P> {
    /// File cache over any policy. Adding a file prunes in the policy's
    /// order, round after round, until the file fits the budget.
    pub fn with_policy(policy: P, max_size: usize, max_file_size: usize, timeout: Duration) -> Self {
        FileCache {
            cache: CacheCore::with_policy(policy, 0, timeout).with_weigher(max_size, byte_len),
            max_file_size,
        }
    }

    /// Contents of the file at `path`, from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::IoError)` if the file has to be read and cannot be.
    pub fn get_file_bytes(&self, path: impl AsRef<Path>) -> Result<Bytes> {
        let path = path.as_ref().to_path_buf();
        if let Some(bytes) = self.cache.get(&path) {
            trace!("FILE GET {} -> HIT", path.display());
            return Ok(bytes);
        }

        let bytes: Bytes = fs::read(&path)?.into();
        if let Some(limit) = self.storage_limit(bytes.len()) {
            debug!(
                "FILE GET {} -> not cached ({} bytes exceeds {})",
                path.display(),
                bytes.len(),
                limit
            );
            return Ok(bytes);
        }

        self.cache.put(path, Arc::clone(&bytes));
        Ok(bytes)
    }

    /// The limit a file of `len` bytes breaks, if any.
    fn storage_limit(&self, len: usize) -> Option<usize> {
        let max_size = self.max_size();
        if self.max_file_size != 0 && len > self.max_file_size {
            Some(self.max_file_size)
        } else if max_size != 0 && len > max_size {
            Some(max_size)
        } else {
            None
        }
    }

    /// Byte budget of the cache, `0` for no limit.
    pub fn max_size(&self) -> usize {
        self.cache.max_weight()
    }

    /// Largest file size that is cached, `0` for no limit.
    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Bytes currently held.
    pub fn used_size(&self) -> usize {
        self.cache.weight()
    }

    pub fn cached_files_count(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_timeout(&self) -> Duration {
        self.cache.timeout()
    }

    /// Drop every cached file, which also resets the used size.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::policy::Fifo;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, len: usize) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).expect("Failed to create file");
        file.write_all(&vec![b'x'; len]).expect("Failed to write file");
        path
    }

    #[test]
    fn test_read_through_and_hit() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_file(&dir, "a.txt", 10);
        let cache = FileCache::lru(64, 0, Duration::ZERO);

        let first = cache.get_file_bytes(&path).expect("Failed to read");
        assert_eq!(first.len(), 10);
        assert_eq!(cache.cached_files_count(), 1);
        assert_eq!(cache.used_size(), 10);

        // Served from the cache even after the file changes on disk.
        write_file(&dir, "a.txt", 3);
        let second = cache.get_file_bytes(&path).expect("Failed to read");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.used_size(), 10);
    }

    #[test]
    fn test_large_files_not_cached() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let small = write_file(&dir, "small", 8);
        let large = write_file(&dir, "large", 64);
        let cache = FileCache::lfu(1024, 16, Duration::ZERO);

        assert_eq!(cache.get_file_bytes(&large).expect("Failed to read").len(), 64);
        assert_eq!(cache.cached_files_count(), 0);
        assert_eq!(cache.used_size(), 0);

        cache.get_file_bytes(&small).expect("Failed to read");
        assert_eq!(cache.cached_files_count(), 1);
        assert_eq!(cache.used_size(), 8);
    }

    #[test]
    fn test_lru_evicts_by_bytes() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let a = write_file(&dir, "a", 8);
        let b = write_file(&dir, "b", 8);
        let c = write_file(&dir, "c", 8);
        let cache = FileCache::lru(20, 0, Duration::ZERO);

        cache.get_file_bytes(&a).expect("Failed to read");
        cache.get_file_bytes(&b).expect("Failed to read");
        let cached_b = cache.get_file_bytes(&b).expect("Failed to read");
        cache.get_file_bytes(&c).expect("Failed to read");

        assert_eq!(cache.cached_files_count(), 2);
        assert_eq!(cache.used_size(), 16);
        assert_eq!(cache.max_size(), 20);
        let again = cache.get_file_bytes(&b).expect("Failed to read");
        assert!(Arc::ptr_eq(&cached_b, &again));
    }

    #[test]
    fn test_lfu_keeps_hot_file_within_budget() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cold = write_file(&dir, "cold", 8);
        let hot = write_file(&dir, "hot", 8);
        let new = write_file(&dir, "new", 8);
        let cache = FileCache::lfu(20, 0, Duration::ZERO);

        cache.get_file_bytes(&cold).expect("Failed to read");
        let cached_hot = cache.get_file_bytes(&hot).expect("Failed to read");
        cache.get_file_bytes(&hot).expect("Failed to read");
        cache.get_file_bytes(&new).expect("Failed to read");

        assert_eq!(cache.cached_files_count(), 2);
        assert_eq!(cache.used_size(), 16);
        let again = cache.get_file_bytes(&hot).expect("Failed to read");
        assert!(Arc::ptr_eq(&cached_hot, &again));
    }

    #[test]
    fn test_used_size_stays_within_budget() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cache = FileCache::lru(2048, 0, Duration::ZERO);

        for i in 0..4 {
            let path = write_file(&dir, &format!("f{}", i), 1024);
            cache.get_file_bytes(&path).expect("Failed to read");
            assert!(cache.used_size() <= cache.max_size());
        }
        assert_eq!(cache.cached_files_count(), 2);
        assert_eq!(cache.used_size(), 2048);
    }

    #[test]
    fn test_fifo_evicts_oldest_files_until_within_budget() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cache = FileCache::with_policy(Fifo, 20, 0, Duration::ZERO);
        for name in ["a", "b", "c"] {
            let path = write_file(&dir, name, 6);
            cache.get_file_bytes(&path).expect("Failed to read");
        }
        assert_eq!(cache.used_size(), 18);

        let big = write_file(&dir, "big", 12);
        cache.get_file_bytes(&big).expect("Failed to read");

        assert_eq!(cache.used_size(), 18);
        assert!(cache.used_size() <= cache.max_size());
        assert_eq!(cache.cached_files_count(), 2);
    }

    #[test]
    fn test_file_over_budget_not_cached() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let small = write_file(&dir, "small", 4);
        let big = write_file(&dir, "big", 12);
        let cache = FileCache::lru(8, 0, Duration::ZERO);

        cache.get_file_bytes(&small).expect("Failed to read");
        assert_eq!(cache.get_file_bytes(&big).expect("Failed to read").len(), 12);
        assert_eq!(cache.cached_files_count(), 1);
        assert_eq!(cache.used_size(), 4);
    }

    #[test]
    fn test_expired_file_gives_bytes_back() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_file(&dir, "a", 6);
        let cache = FileCache::lfu(0, 0, Duration::from_millis(20));

        cache.get_file_bytes(&path).expect("Failed to read");
        assert_eq!(cache.used_size(), 6);
        std::thread::sleep(Duration::from_millis(40));

        // The expired copy is dropped and the file is read again.
        cache.get_file_bytes(&path).expect("Failed to read");
        assert_eq!(cache.cached_files_count(), 1);
        assert_eq!(cache.used_size(), 6);
    }

    #[test]
    fn test_clear_resets_used_size() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_file(&dir, "a", 20);
        let cache = FileCache::lru(0, 0, Duration::from_secs(60));

        cache.get_file_bytes(&path).expect("Failed to read");
        cache.clear();

        assert_eq!(cache.cached_files_count(), 0);
        assert_eq!(cache.used_size(), 0);
        assert_eq!(cache.cache_timeout(), Duration::from_secs(60));
        assert_eq!(cache.max_size(), 0);
        assert_eq!(cache.max_file_size(), 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cache = FileCache::lru(64, 0, Duration::ZERO);

        let result = cache.get_file_bytes(dir.path().join("absent"));
        assert!(matches!(result, Err(Error::IoError(_))));
        assert_eq!(cache.cached_files_count(), 0);
    }
}
