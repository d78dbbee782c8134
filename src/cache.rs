use std::ops::DerefMut;
use std::time::Duration;

use actix_web::web;
use log::{debug, info, warn};
use r2d2_redis::r2d2;
use r2d2_redis::redis::{self, Commands};
use r2d2_redis::RedisConnectionManager;

use crate::config::Config;
use crate::error::ServiceError;
use crate::models::Menu;

pub(crate) type RedisPool = r2d2::Pool<RedisConnectionManager>;

pub(crate) const MENU_KEY: &str = "menu";
/// Bumped on every invalidation. A menu loaded under an older generation
/// is never written back.
pub(crate) const GENERATION_KEY: &str = "menu:generation";

const CACHE_CONNECTION_TIMEOUT_MILLIS: u64 = 500;

/// Result of a cache read.
#[derive(Debug)]
pub(crate) enum Lookup {
    Hit(Menu),
    /// The generation seen alongside the miss; `None` when the cache is off
    /// or unreachable.
    Miss(Option<u64>),
}

/// Read-through cache for the public menu. Without Redis every lookup is a
/// miss and every write a no-op.
#[derive(Clone)]
pub(crate) struct MenuCache {
    pool: Option<RedisPool>,
    expire_seconds: usize,
}

impl MenuCache {
    pub(crate) fn connect(config: &Config) -> Self {
        let expire_seconds = config.cache_expire_seconds as usize;
        let url = match &config.redis_url {
            Some(url) => url,
            None => {
                info!("REDIS_URL not set, menu cache disabled");
                return MenuCache::disabled(expire_seconds);
            }
        };
        let manager = match RedisConnectionManager::new(url.as_str()) {
            Ok(manager) => manager,
            Err(e) => {
                warn!("invalid REDIS_URL, menu cache disabled: {}", e);
                return MenuCache::disabled(expire_seconds);
            }
        };
        // unchecked so that a Redis outage at boot does not keep the service down
        let pool = r2d2::Pool::builder()
            .max_size(config.cache_pool_max_open)
            .min_idle(Some(config.cache_pool_min_idle))
            .max_lifetime(Some(Duration::from_secs(config.cache_expire_seconds)))
            .connection_timeout(Duration::from_millis(CACHE_CONNECTION_TIMEOUT_MILLIS))
            .build_unchecked(manager);
        MenuCache {
            pool: Some(pool),
            expire_seconds,
        }
    }

    pub(crate) fn disabled(expire_seconds: usize) -> Self {
        MenuCache {
            pool: None,
            expire_seconds,
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    pub(crate) fn get(&self) -> Result<Lookup, ServiceError> {
        let pool = match &self.pool {
            Some(pool) => pool,
            None => return Ok(Lookup::Miss(None)),
        };
        let mut redis_conn = pool.get().map_err(|e| ServiceError::Cache(e.to_string()))?;
        let redis_conn = redis_conn.deref_mut();
        let (value, generation): (Option<Vec<u8>>, Option<u64>) = redis::pipe()
            .get(MENU_KEY)
            .get(GENERATION_KEY)
            .query(redis_conn)
            .map_err(|e| ServiceError::Cache(e.to_string()))?;
        match value {
            Some(bytes) if !bytes.is_empty() => Menu::from_u8(bytes)
                .map(Lookup::Hit)
                .map_err(|e| ServiceError::Cache(e.to_string())),
            _ => Ok(Lookup::Miss(Some(generation.unwrap_or(0)))),
        }
    }

    /// Caches `menu` if no invalidation happened since `generation` was
    /// read. Returns whether the menu was written.
    pub(crate) fn put(&self, menu: &Menu, generation: u64) -> Result<bool, ServiceError> {
        let pool = match &self.pool {
            Some(pool) => pool,
            None => return Ok(false),
        };
        let bytes = menu.to_bytes().map_err(|e| ServiceError::Cache(e.to_string()))?;
        let mut redis_conn = pool.get().map_err(|e| ServiceError::Cache(e.to_string()))?;
        let redis_conn = redis_conn.deref_mut();
        let expire_seconds = self.expire_seconds;
        redis::transaction(redis_conn, &[GENERATION_KEY], |conn, pipe| {
            let current: Option<u64> = conn.get(GENERATION_KEY)?;
            if current.unwrap_or(0) != generation {
                return Ok(Some(false));
            }
            pipe.set_ex(MENU_KEY, &*bytes, expire_seconds)
                .ignore()
                .query::<Option<()>>(conn)
                .map(|written| written.map(|_| true))
        })
        .map_err(|e| ServiceError::Cache(e.to_string()))
    }

    pub(crate) fn evict(&self) -> Result<(), ServiceError> {
        let pool = match &self.pool {
            Some(pool) => pool,
            None => return Ok(()),
        };
        let mut redis_conn = pool.get().map_err(|e| ServiceError::Cache(e.to_string()))?;
        let redis_conn = redis_conn.deref_mut();
        redis::pipe()
            .atomic()
            .incr(GENERATION_KEY, 1)
            .ignore()
            .del(MENU_KEY)
            .ignore()
            .query::<()>(redis_conn)
            .map_err(|e| ServiceError::Cache(e.to_string()))
    }

    /// Looks the menu up off the async executor. Cache trouble is logged
    /// and reported as a miss that must not be written back.
    pub(crate) async fn fetch(&self) -> Lookup {
        if !self.is_enabled() {
            return Lookup::Miss(None);
        }
        let cache = self.clone();
        let read = web::block(move || cache.get())
            .await
            .map_err(ServiceError::from)
            .and_then(|r| r);
        read.unwrap_or_else(|e| {
            warn!("menu cache read failed: {}", e);
            Lookup::Miss(None)
        })
    }

    pub(crate) async fn store(&self, menu: Menu, generation: u64) {
        if !self.is_enabled() {
            return;
        }
        let cache = self.clone();
        let written = web::block(move || cache.put(&menu, generation))
            .await
            .map_err(ServiceError::from)
            .and_then(|r| r);
        match written {
            Ok(true) => {}
            Ok(false) => debug!(
                "menu invalidated while loading, generation {} not cached",
                generation
            ),
            Err(e) => warn!("menu cache write failed: {}", e),
        }
    }

    /// Drops the cached menu after a dish or combo changed.
    pub(crate) async fn invalidate(&self) {
        if !self.is_enabled() {
            return;
        }
        let cache = self.clone();
        let evicted = web::block(move || cache.evict())
            .await
            .map_err(ServiceError::from)
            .and_then(|r| r);
        if let Err(e) = evicted {
            warn!("menu cache eviction failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_cache_always_misses() {
        let cache = MenuCache::disabled(60);
        assert!(!cache.is_enabled());
        assert!(matches!(cache.get().unwrap(), Lookup::Miss(None)));
        assert!(!cache.put(&Menu::default(), 0).unwrap());
        assert!(cache.evict().is_ok());
    }

    #[test]
    fn missing_redis_url_disables_the_cache() {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mysql://localhost/menu".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(!MenuCache::connect(&config).is_enabled());
    }

    #[actix_web::test]
    async fn invalidating_a_disabled_cache_is_quiet() {
        let cache = MenuCache::disabled(60);
        cache.invalidate().await;
        assert!(matches!(cache.fetch().await, Lookup::Miss(None)));
    }

    /// Needs a live Redis; runs only when `REDIS_URL` is set.
    #[test]
    fn menu_loaded_before_an_invalidation_is_not_written_back() {
        let url = match std::env::var("REDIS_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return,
        };
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mysql://localhost/menu".to_string()),
            "REDIS_URL" => Some(url.clone()),
            _ => None,
        })
        .unwrap();
        let cache = MenuCache::connect(&config);
        cache.evict().unwrap();

        let generation = match cache.get().unwrap() {
            Lookup::Miss(Some(generation)) => generation,
            other => panic!("expected a miss, got {:?}", other),
        };
        // a dish write lands between the load and the write-back
        cache.evict().unwrap();
        assert!(!cache.put(&Menu::default(), generation).unwrap());
        assert!(matches!(cache.get().unwrap(), Lookup::Miss(Some(_))));

        let generation = match cache.get().unwrap() {
            Lookup::Miss(Some(generation)) => generation,
            other => panic!("expected a miss, got {:?}", other),
        };
        assert!(cache.put(&Menu::default(), generation).unwrap());
        assert!(matches!(cache.get().unwrap(), Lookup::Hit(_)));
        cache.evict().unwrap();
    }
}
