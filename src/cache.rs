//! In-memory caching using moka
//!
//! Caches the public vehicle catalog. The catalog only changes through admin
//! pricing edits, which invalidate it.
//!
//! Every invalidation bumps a generation counter. A value read from the store
//! is only kept if no invalidation happened since the read started, so a
//! slow load can never write back a catalog older than the last edit.

use moka::future::Cache;
use serde::Serialize;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::db::{CatalogStore, StoreError};
use crate::models::{Vehicle, VehicleCategory};

/// Application cache holding catalog listings and vehicle pages
#[derive(Clone)]
pub struct AppCache {
    /// Catalog listings (category key -> vehicles)
    pub vehicle_listings: Cache<String, Arc<Vec<Vehicle>>>,
    /// Vehicles (slug -> Vehicle)
    pub vehicles: Cache<String, Arc<Vehicle>>,
    generation: Arc<AtomicU64>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Listings: all + one per category, 30 min TTL
            vehicle_listings: Cache::builder()
                .max_capacity(8)
                .time_to_live(Duration::from_secs(30 * 60))
                .build(),

            // Vehicle pages: 100 entries, 30 min TTL, 10 min idle
            vehicles: Cache::builder()
                .max_capacity(100)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),

            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            vehicle_listings_size: self.vehicle_listings.entry_count(),
            vehicles_size: self.vehicles.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        // Bump first so loads already in flight discard what they read
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.vehicle_listings.invalidate_all();
        self.vehicles.invalidate_all();
        info!("All caches invalidated");
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Insert a value loaded at `generation`, unless the cache was
    /// invalidated since.
    ///
    /// The second check covers an invalidation landing between the first
    /// check and the insert; one landing after the insert clears the entry
    /// itself.
    async fn insert_if_current<K, V>(&self, cache: &Cache<K, V>, key: K, value: V, generation: u64)
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        if self.generation() != generation {
            debug!("Cache invalidated during load; not caching");
            return;
        }
        cache.insert(key.clone(), value).await;
        if self.generation() != generation {
            cache.invalidate(&key).await;
        }
    }

    /// Generate cache key for a catalog listing
    pub fn listing_key(category: Option<VehicleCategory>) -> String {
        match category {
            Some(category) => format!("vehicles:{}", category.as_str()),
            None => "vehicles:all".to_string(),
        }
    }

    /// Catalog listing, loaded from the store on a miss
    pub async fn vehicle_listing<S: CatalogStore + ?Sized>(
        &self,
        store: &S,
        category: Option<VehicleCategory>,
    ) -> Result<Arc<Vec<Vehicle>>, StoreError> {
        let key = Self::listing_key(category);
        if let Some(cached) = self.vehicle_listings.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(cached);
        }

        debug!("Cache miss for {}", key);
        let generation = self.generation();
        let vehicles = Arc::new(store.list_vehicles(category).await?);
        self.insert_if_current(&self.vehicle_listings, key, vehicles.clone(), generation)
            .await;
        Ok(vehicles)
    }

    /// One vehicle by slug, loaded from the store on a miss
    pub async fn vehicle<S: CatalogStore + ?Sized>(
        &self,
        store: &S,
        slug: &str,
    ) -> Result<Option<Arc<Vehicle>>, StoreError> {
        if let Some(cached) = self.vehicles.get(slug).await {
            debug!("Cache hit for vehicle {}", slug);
            return Ok(Some(cached));
        }

        debug!("Cache miss for vehicle {}", slug);
        let generation = self.generation();
        match store.vehicle_by_slug(slug).await? {
            Some(vehicle) => {
                let vehicle = Arc::new(vehicle);
                self.insert_if_current(&self.vehicles, slug.to_string(), vehicle.clone(), generation)
                    .await;
                Ok(Some(vehicle))
            }
            None => Ok(None),
        }
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub vehicle_listings_size: u64,
    pub vehicles_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer<S: CatalogStore + ?Sized>(cache: AppCache, store: Arc<S>) {
    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache, store.as_ref()).await;
    }
}

/// Warm the cache with the full catalog and each category listing
async fn warm_cache<S: CatalogStore + ?Sized>(cache: &AppCache, store: &S) {
    info!("Starting cache warm-up...");

    let generation = cache.generation();
    match store.list_vehicles(None).await {
        Ok(vehicles) => {
            for vehicle in &vehicles {
                cache
                    .insert_if_current(
                        &cache.vehicles,
                        vehicle.slug.clone(),
                        Arc::new(vehicle.clone()),
                        generation,
                    )
                    .await;
            }

            for category in [VehicleCategory::Boat, VehicleCategory::Bus] {
                let listing: Vec<Vehicle> = vehicles
                    .iter()
                    .filter(|v| v.category == category)
                    .cloned()
                    .collect();
                cache
                    .insert_if_current(
                        &cache.vehicle_listings,
                        AppCache::listing_key(Some(category)),
                        Arc::new(listing),
                        generation,
                    )
                    .await;
            }

            cache
                .insert_if_current(
                    &cache.vehicle_listings,
                    AppCache::listing_key(None),
                    Arc::new(vehicles),
                    generation,
                )
                .await;
        }
        Err(e) => warn!("Failed to warm vehicle cache: {}", e),
    }

    cache.vehicle_listings.run_pending_tasks().await;
    cache.vehicles.run_pending_tasks().await;
    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::fixtures::{carver_yacht, prevost_bus};
    use crate::db::memory::MemoryStore;
    use crate::models::PricingUpdate;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn bus_price_raise() -> PricingUpdate {
        PricingUpdate {
            price_per_hour: dec!(450),
            minimum_hours: 3,
            maximum_hours: 48,
            fuel_charge_percent: dec!(20),
        }
    }

    /// Store where an admin pricing edit lands after the catalog was read
    /// but before the caller caches it.
    struct EditedDuringRead {
        inner: MemoryStore,
        cache: AppCache,
        bus_id: Uuid,
    }

    #[async_trait]
    impl CatalogStore for EditedDuringRead {
        async fn list_vehicles(&self, category: Option<VehicleCategory>) -> Result<Vec<Vehicle>, StoreError> {
            let snapshot = self.inner.list_vehicles(category).await?;
            self.inner.update_pricing(self.bus_id, &bus_price_raise()).await?;
            self.cache.invalidate_all();
            Ok(snapshot)
        }

        async fn vehicle_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
            self.inner.vehicle_by_id(id).await
        }

        async fn vehicle_by_slug(&self, slug: &str) -> Result<Option<Vehicle>, StoreError> {
            let snapshot = self.inner.vehicle_by_slug(slug).await?;
            self.inner.update_pricing(self.bus_id, &bus_price_raise()).await?;
            self.cache.invalidate_all();
            Ok(snapshot)
        }

        async fn update_pricing(&self, id: Uuid, update: &PricingUpdate) -> Result<bool, StoreError> {
            self.inner.update_pricing(id, update).await
        }
    }

    fn edited_during_read(cache: &AppCache) -> EditedDuringRead {
        let bus = prevost_bus();
        EditedDuringRead {
            bus_id: bus.id,
            inner: MemoryStore::with_vehicles(vec![bus, carver_yacht()]),
            cache: cache.clone(),
        }
    }

    #[test]
    fn test_listing_keys() {
        assert_eq!(AppCache::listing_key(None), "vehicles:all");
        assert_eq!(AppCache::listing_key(Some(VehicleCategory::Boat)), "vehicles:boat");
    }

    #[tokio::test]
    async fn test_listing_is_served_from_cache_until_invalidated() {
        let bus = prevost_bus();
        let store = MemoryStore::with_vehicles(vec![bus.clone(), carver_yacht()]);
        let cache = AppCache::new();

        let first = cache.vehicle_listing(&store, None).await.unwrap();
        assert_eq!(first.len(), 2);
        let buses = cache.vehicle_listing(&store, Some(VehicleCategory::Bus)).await.unwrap();
        assert_eq!(buses.len(), 1);

        store.update_pricing(bus.id, &bus_price_raise()).await.unwrap();

        let stale = cache.vehicle_listing(&store, Some(VehicleCategory::Bus)).await.unwrap();
        assert_eq!(stale[0].price_per_hour, dec!(400));

        cache.invalidate_all();
        let fresh = cache.vehicle_listing(&store, Some(VehicleCategory::Bus)).await.unwrap();
        assert_eq!(fresh[0].price_per_hour, dec!(450));
    }

    #[tokio::test]
    async fn test_vehicle_lookup_misses_are_not_cached() {
        let store = MemoryStore::with_vehicles(vec![carver_yacht()]);
        let cache = AppCache::new();

        assert!(cache.vehicle(&store, "carver-yacht").await.unwrap().is_some());
        assert!(cache.vehicle(&store, "submarine").await.unwrap().is_none());
        assert!(cache.vehicles.get("submarine").await.is_none());
    }

    #[tokio::test]
    async fn test_warm_cache_fills_listings() {
        let store = MemoryStore::with_vehicles(vec![prevost_bus(), carver_yacht()]);
        let cache = AppCache::new();

        warm_cache(&cache, &store).await;

        let stats = cache.stats();
        assert_eq!(stats.vehicle_listings_size, 3);
        assert_eq!(stats.vehicles_size, 2);
    }

    #[tokio::test]
    async fn test_warm_cache_discards_catalog_read_before_invalidation() {
        let cache = AppCache::new();
        let store = edited_during_read(&cache);

        warm_cache(&cache, &store).await;

        assert!(cache.vehicle_listings.get(&AppCache::listing_key(None)).await.is_none());
        assert!(cache.vehicles.get("prevost-tour-bus").await.is_none());

        // The next load sees the edit
        let buses = cache
            .vehicle_listing(&store.inner, Some(VehicleCategory::Bus))
            .await
            .unwrap();
        assert_eq!(buses[0].price_per_hour, dec!(450));
    }

    #[tokio::test]
    async fn test_cache_miss_read_before_invalidation_is_not_kept() {
        let cache = AppCache::new();
        let store = edited_during_read(&cache);

        let stale = cache.vehicle_listing(&store, Some(VehicleCategory::Bus)).await.unwrap();
        assert_eq!(stale[0].price_per_hour, dec!(400));
        assert!(cache
            .vehicle_listings
            .get(&AppCache::listing_key(Some(VehicleCategory::Bus)))
            .await
            .is_none());

        assert!(cache.vehicle(&store, "carver-yacht").await.unwrap().is_some());
        assert!(cache.vehicles.get("carver-yacht").await.is_none());
    }
}
