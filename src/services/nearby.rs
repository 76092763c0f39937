use std::sync::Arc;

use crate::core::{calculate_bounding_box, NearbyResult, ProximityEngine};
use crate::models::{Coordinate, NearbyQuery, User};
use crate::services::cache::{CacheKey, CacheManager};
use crate::services::store::{StoreError, UserStore};

/// Nearby-users lookups backed by the user store and result cache
#[derive(Clone)]
pub struct NearbyService {
    store: Arc<dyn UserStore>,
    cache: Arc<CacheManager>,
    engine: ProximityEngine,
    use_bounding_box: bool,
}

impl NearbyService {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<CacheManager>,
        engine: ProximityEngine,
        use_bounding_box: bool,
    ) -> Self {
        Self {
            store,
            cache,
            engine,
            use_bounding_box,
        }
    }

    /// Users within `query.radius_km` of `query.center`
    ///
    /// The cache generation is read before the scan, so a result computed
    /// from rows that a concurrent update has since changed is stored under
    /// a retired key and never served.
    pub async fn find_nearby(&self, query: &NearbyQuery) -> Result<Vec<User>, StoreError> {
        let key = match self.cache.generation().await {
            Ok(generation) => Some(CacheKey::nearby(generation, query)),
            Err(e) => {
                tracing::warn!("Cache generation unavailable, skipping cache: {}", e);
                None
            }
        };

        if let Some(key) = &key {
            if let Ok(users) = self.cache.get::<Vec<User>>(key).await {
                tracing::debug!("Serving nearby query {} from cache", key);
                return Ok(users);
            }
        }

        let result = self.scan(query).await?;

        tracing::info!(
            "Found {} nearby users within {}km (from {} candidates)",
            result.users.len(),
            query.radius_km,
            result.total_candidates
        );

        if let Some(key) = &key {
            if let Err(e) = self.cache.set(key, &result.users).await {
                tracing::warn!("Failed to cache nearby result: {}", e);
            }
        }

        Ok(result.users)
    }

    /// Run the proximity scan against the store, bypassing the cache
    pub async fn scan(&self, query: &NearbyQuery) -> Result<NearbyResult, StoreError> {
        if query.radius_km.is_nan() || query.radius_km < 0.0 || !query.center.is_valid() {
            return Ok(NearbyResult {
                users: Vec::new(),
                total_candidates: 0,
            });
        }

        let bbox = self
            .use_bounding_box
            .then(|| calculate_bounding_box(query.center, query.radius_km));

        let candidates = self.store.list_users_with_coordinates(bbox.as_ref()).await?;

        Ok(self.engine.search(&candidates, query))
    }

    /// Store a user's new coordinate and drop every cached nearby result
    pub async fn update_location(
        &self,
        user_id: i64,
        coordinate: Coordinate,
    ) -> Result<Option<User>, StoreError> {
        let user = self.store.update_location(user_id, coordinate).await?;
        self.invalidate().await;
        Ok(user)
    }

    /// Retire cached nearby results after users or their music change
    pub async fn invalidate(&self) {
        if let Err(e) = self.cache.next_generation().await {
            tracing::warn!("Failed to invalidate nearby cache: {}", e);
        }
    }
}
