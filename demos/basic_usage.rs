//! Basic usage example of the hoard caches.

use hoard::{
    error::Result, Cache, CacheConfig, LfuCache, LruCache, PolicyKind, RemovalCause, TimedCache,
    WeakCache,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Example value: a rendered page
#[derive(Clone, Debug)]
struct Page {
    path: String,
    body: String,
}

impl Page {
    fn render(path: &str) -> Self {
        println!("  [RENDER] {}", path);
        Page {
            path: path.to_string(),
            body: format!("<h1>{}</h1>", path),
        }
    }
}

fn fetch(cache: &dyn Cache<String, Page>, path: &str) -> Page {
    let key = path.to_string();
    if let Some(page) = cache.get(&key) {
        return page;
    }
    let page = Page::render(path);
    cache.put(key, page.clone());
    page
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== hoard - Basic Example ===\n");

    // 1. LRU cache with a removal listener
    println!("1. LRU cache (capacity 2):");
    let lru: LruCache<String, Page> =
        LruCache::new(2).with_listener(|key: &String, _: &Page, cause: RemovalCause| {
            println!("  [REMOVE] {} ({})", key, cause);
        });

    fetch(&lru, "/home");
    fetch(&lru, "/about");
    fetch(&lru, "/home");
    fetch(&lru, "/contact");
    let stats = lru.stats();
    println!(
        "   ✓ {} hits, {} misses, hit rate {:.0}%\n",
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );

    // 2. LFU cache keeps the popular entry
    println!("2. LFU cache (capacity 2):");
    let lfu: LfuCache<&str, u32> = LfuCache::new(2);
    lfu.put("popular", 1);
    lfu.put("rare", 2);
    for _ in 0..3 {
        lfu.get(&"popular");
    }
    lfu.put("new", 3);
    println!(
        "   ✓ popular kept: {}, rare kept: {}\n",
        lfu.contains_key(&"popular"),
        lfu.contains_key(&"rare")
    );

    // 3. Time-only cache with background pruning
    println!("3. Timed cache (TTL 50ms, pruned every 20ms):");
    let timed = TimedCache::new(Duration::from_millis(50));
    timed.put("session:1", "alice");
    timed.put_with_ttl("session:2", "bob", Duration::ZERO);
    timed.schedule_prune(Duration::from_millis(20))?;
    thread::sleep(Duration::from_millis(120));
    println!("   ✓ {} session(s) left after expiry\n", timed.len());
    timed.cancel_prune_schedule();

    // 4. Weak cache follows its owners
    println!("4. Weak cache:");
    let weak = WeakCache::new();
    let page = Arc::new(Page::render("/shared"));
    weak.put("/shared", Arc::clone(&page));
    if let Some(cached) = weak.get(&"/shared") {
        println!("   ✓ cached while owned: {} ({} bytes)", cached.path, cached.body.len());
    }
    drop(page);
    println!("   ✓ after drop: {:?}\n", weak.get(&"/shared").map(|p| p.path.clone()));

    // 5. Cache from configuration
    println!("5. Cache from JSON config:");
    let config =
        CacheConfig::from_json(r#"{"policy": "fifo", "capacity": 100, "default_ttl_ms": 60000}"#)?;
    assert_eq!(config.policy, PolicyKind::Fifo);
    let cache = config.build::<String, Page>()?;
    fetch(cache.as_ref(), "/docs");
    fetch(cache.as_ref(), "/docs");
    println!("   ✓ {} entry, limit {}\n", cache.len(), cache.limit());

    println!("=== Example Complete ===\n");
    Ok(())
}
