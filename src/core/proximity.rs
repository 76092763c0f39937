use crate::core::distance::haversine_distance;
use crate::models::{Coordinate, NearbyQuery, User};

/// Result of a proximity scan
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyResult {
    pub users: Vec<User>,
    pub total_candidates: usize,
}

/// Filter `candidates` down to the users within `radius_km` of `query`
///
/// Candidates without a coordinate, or with a non-finite or out-of-range one,
/// are skipped. The boundary is inclusive and input order is preserved. A
/// negative or NaN radius, or an invalid query point, matches nothing.
pub fn find_nearby(candidates: &[User], query: Coordinate, radius_km: f64) -> Vec<User> {
    within_radius(candidates, query, radius_km)
        .map(|(user, _)| user.clone())
        .collect()
}

fn within_radius<'a>(
    candidates: &'a [User],
    query: Coordinate,
    radius_km: f64,
) -> impl Iterator<Item = (&'a User, f64)> + 'a {
    let searchable = query.is_valid() && radius_km >= 0.0;

    candidates
        .iter()
        .filter(move |_| searchable)
        .filter_map(|user| match user.coordinate() {
            Some(coordinate) if coordinate.is_valid() => Some((user, coordinate)),
            Some(coordinate) => {
                tracing::debug!("Skipping user {} with malformed coordinate {:?}", user.id, coordinate);
                None
            }
            None => None,
        })
        .map(move |(user, coordinate)| (user, haversine_distance(query, coordinate)))
        .filter(move |(_, distance_km)| *distance_km <= radius_km)
}

/// Proximity search over a snapshot of users
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityEngine {
    sort_by_distance: bool,
}

impl ProximityEngine {
    pub fn new(sort_by_distance: bool) -> Self {
        Self { sort_by_distance }
    }

    /// Run a nearby query against `candidates`
    ///
    /// Results keep the candidates' order unless the engine was built to
    /// rank by ascending distance, in which case ties keep input order.
    pub fn search(&self, candidates: &[User], query: &NearbyQuery) -> NearbyResult {
        let total_candidates = candidates.len();

        let mut matched: Vec<(&User, f64)> =
            within_radius(candidates, query.center, query.radius_km).collect();

        if self.sort_by_distance {
            matched.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        }

        NearbyResult {
            users: matched.into_iter().map(|(user, _)| user.clone()).collect(),
            total_candidates,
        }
    }
}
