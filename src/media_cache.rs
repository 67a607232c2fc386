use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

/// In-memory media cache for one gallery view.
///
/// Maps a canonical remote URL to a minted local object URL whose bytes are
/// held by the cache itself. Entries live until `release_all`, which the
/// owning controller calls exactly once at view teardown; warm completions
/// that straggle in after that carry a stale epoch and fall on the floor.
#[derive(Debug, Default)]
pub struct MediaCache {
    entries: HashMap<String, String>,       // remote url -> object url
    blobs: HashMap<String, Arc<Vec<u8>>>,   // object url -> bytes
    next_id: u64,
    epoch: u64,
}

impl MediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch to stamp onto in-flight warm operations. Writes that come back
    /// with an older stamp are discarded by `insert`.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Pure lookup of the local reference for a remote URL. Never fetches.
    pub fn get(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(String::as_str)
    }

    /// Resolve a minted object URL back to its bytes. `None` once released.
    pub fn bytes_for(&self, object_url: &str) -> Option<Arc<Vec<u8>>> {
        self.blobs.get(object_url).cloned()
    }

    /// Bytes for a remote URL, if warmed.
    pub fn bytes_for_remote(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.get(url).and_then(|obj| self.blobs.get(obj)).cloned()
    }

    /// Commit a completed warm fetch. Idempotent per key: a second write for
    /// the same URL returns the existing reference without minting another.
    /// A stale `epoch` (the cache was released while the fetch was in
    /// flight) is a benign no-op and returns `None`.
    pub fn insert(&mut self, epoch: u64, url: &str, bytes: Vec<u8>) -> Option<String> {
        if epoch != self.epoch {
            return None;
        }
        if let Some(existing) = self.entries.get(url) {
            return Some(existing.clone());
        }
        self.next_id += 1;
        let object_url = format!("blob:folioview/{:x}", self.next_id);
        self.blobs.insert(object_url.clone(), Arc::new(bytes));
        self.entries.insert(url.to_string(), object_url.clone());
        Some(object_url)
    }

    /// Free every local reference and clear the mapping. Safe while warming
    /// is still in flight; the epoch bump turns late writes into no-ops.
    pub fn release_all(&mut self) {
        self.entries.clear();
        self.blobs.clear();
        self.epoch += 1;
    }

    /// Whether a URL is worth warming at all: http/https absolute or rooted
    /// at the site base. Already-local `blob:`/`data:` references (and any
    /// other scheme) are skipped.
    pub fn is_fetchable(url: &str) -> bool {
        let t = url.trim();
        if t.is_empty() {
            return false;
        }
        match Url::parse(t) {
            Ok(u) => matches!(u.scheme(), "http" | "https"),
            // no scheme: fetchable when rooted, since the site base joins it
            Err(_) => t.starts_with('/'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let mut cache = MediaCache::new();
        let epoch = cache.epoch();
        let obj = cache.insert(epoch, "/t.png", vec![1, 2, 3]).unwrap();
        assert!(obj.starts_with("blob:folioview/"));
        assert_eq!(cache.get("/t.png"), Some(obj.as_str()));
        assert_eq!(cache.bytes_for(&obj).unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(cache.bytes_for_remote("/t.png").unwrap().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn second_insert_is_idempotent() {
        let mut cache = MediaCache::new();
        let epoch = cache.epoch();
        let first = cache.insert(epoch, "/m.glb", vec![7]).unwrap();
        let second = cache.insert(epoch, "/m.glb", vec![8, 9]).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        // original bytes win; the duplicate fetch is discarded
        assert_eq!(cache.bytes_for_remote("/m.glb").unwrap().as_slice(), &[7]);
    }

    #[test]
    fn stale_epoch_write_is_dropped() {
        let mut cache = MediaCache::new();
        let stamped = cache.epoch();
        cache.release_all();
        assert_eq!(cache.insert(stamped, "/late.png", vec![0]), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn release_invalidates_every_reference() {
        let mut cache = MediaCache::new();
        let epoch = cache.epoch();
        let a = cache.insert(epoch, "/a.png", vec![1]).unwrap();
        let b = cache.insert(epoch, "/b.png", vec![2]).unwrap();
        cache.release_all();
        assert!(cache.is_empty());
        assert!(cache.bytes_for(&a).is_none());
        assert!(cache.bytes_for(&b).is_none());
        assert_eq!(cache.get("/a.png"), None);
    }

    #[test]
    fn fetchable_schemes() {
        assert!(MediaCache::is_fetchable("https://cdn.test/a.png"));
        assert!(MediaCache::is_fetchable("http://cdn.test/a.png"));
        assert!(MediaCache::is_fetchable("/models/a.glb"));
        assert!(!MediaCache::is_fetchable("blob:folioview/1"));
        assert!(!MediaCache::is_fetchable("data:image/png;base64,AA"));
        assert!(!MediaCache::is_fetchable("a.glb"));
        assert!(!MediaCache::is_fetchable(""));
    }
}
