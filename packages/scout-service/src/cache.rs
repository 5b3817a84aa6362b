//! Shared bounded in-memory cache with expire-after-write semantics and
//! recorded hit/miss counters. Backs the query-expansion L1, the session L1,
//! and the channel metadata cache.

use std::{
	collections::HashMap,
	hash::Hash,
	sync::{
		Mutex,
		atomic::{AtomicU64, Ordering},
	},
	time::{Duration, Instant},
};

use serde::Serialize;

struct Entry<V> {
	value: V,
	// Write sequence, not a timestamp: eviction order must be total even
	// when two inserts land on the same clock tick.
	seq: u64,
	expires_at: Instant,
}

pub struct TtlCache<K, V> {
	entries: Mutex<HashMap<K, Entry<V>>>,
	capacity: usize,
	ttl: Duration,
	write_seq: AtomicU64,
	hits: AtomicU64,
	misses: AtomicU64,
}
impl<K, V> TtlCache<K, V>
where
	K: Clone + Eq + Hash,
	V: Clone,
{
	pub fn new(capacity: usize, ttl: Duration) -> Self {
		Self {
			entries: Mutex::new(HashMap::new()),
			capacity: capacity.max(1),
			ttl,
			write_seq: AtomicU64::new(0),
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
		}
	}

	pub fn get(&self, key: &K) -> Option<V> {
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		match entries.get(key) {
			Some(entry) if entry.expires_at > now => {
				self.hits.fetch_add(1, Ordering::Relaxed);

				Some(entry.value.clone())
			},
			Some(_) => {
				entries.remove(key);
				self.misses.fetch_add(1, Ordering::Relaxed);

				None
			},
			None => {
				self.misses.fetch_add(1, Ordering::Relaxed);

				None
			},
		}
	}

	pub fn insert(&self, key: K, value: V) {
		let now = Instant::now();
		let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.insert(key, Entry { value, seq, expires_at: now + self.ttl });

		if entries.len() > self.capacity {
			Self::evict(&mut entries, self.capacity, now);
		}
	}

	pub fn invalidate(&self, key: &K) {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.remove(key);
	}

	pub fn clear(&self) -> usize {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let cleared = entries.len();

		entries.clear();

		cleared
	}

	pub fn len(&self) -> usize {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn stats(&self) -> CacheStats {
		let hits = self.hits.load(Ordering::Relaxed);
		let misses = self.misses.load(Ordering::Relaxed);
		let total = hits + misses;
		let hit_rate = if total == 0 { 0.0 } else { hits as f64 / total as f64 };

		CacheStats { size: self.len(), hits, misses, hit_rate }
	}

	/// Expired entries go first; if the map is still over capacity, the
	/// oldest writes go next.
	fn evict(entries: &mut HashMap<K, Entry<V>>, capacity: usize, now: Instant) {
		entries.retain(|_, entry| entry.expires_at > now);

		while entries.len() > capacity {
			let Some(oldest) =
				entries.iter().min_by_key(|(_, entry)| entry.seq).map(|(key, _)| key.clone())
			else {
				break;
			};

			entries.remove(&oldest);
		}
	}
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
	pub size: usize,
	pub hits: u64,
	pub misses: u64,
	pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn get_put_and_counters() {
		let cache = TtlCache::new(10, Duration::from_secs(60));

		assert_eq!(cache.get(&"a"), None);

		cache.insert("a", 1);

		assert_eq!(cache.get(&"a"), Some(1));

		let stats = cache.stats();

		assert_eq!(stats.hits, 1);
		assert_eq!(stats.misses, 1);
		assert!((stats.hit_rate - 0.5).abs() <= 1e-9);
	}

	#[test]
	fn expired_entries_miss() {
		let cache = TtlCache::new(10, Duration::from_millis(0));

		cache.insert("a", 1);

		assert_eq!(cache.get(&"a"), None);
		assert_eq!(cache.len(), 0);
	}

	#[test]
	fn capacity_evicts_oldest_writes() {
		let cache = TtlCache::new(2, Duration::from_secs(60));

		cache.insert("a", 1);
		cache.insert("b", 2);
		cache.insert("c", 3);

		assert_eq!(cache.len(), 2);
		assert_eq!(cache.get(&"a"), None);
		assert_eq!(cache.get(&"b"), Some(2));
		assert_eq!(cache.get(&"c"), Some(3));
	}

	#[test]
	fn rewriting_a_key_refreshes_its_eviction_order() {
		let cache = TtlCache::new(2, Duration::from_secs(60));

		cache.insert("a", 1);
		cache.insert("b", 2);
		cache.insert("a", 10);
		cache.insert("c", 3);

		assert_eq!(cache.get(&"a"), Some(10));
		assert_eq!(cache.get(&"b"), None);
	}

	#[test]
	fn clear_reports_removed_count() {
		let cache = TtlCache::new(10, Duration::from_secs(60));

		cache.insert("a", 1);
		cache.insert("b", 2);

		assert_eq!(cache.clear(), 2);
		assert!(cache.is_empty());
	}
}
