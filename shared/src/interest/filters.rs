use nalgebra::Vector3;

use crate::{scene::EntityId, types::ConnectionId};

/// Everything a filter may look at when judging one entity for one
/// connection.
#[derive(Clone, Debug, PartialEq)]
pub struct RelevanceParams {
    pub connection: ConnectionId,
    pub entity: EntityId,
    /// Entity position minus observer position
    pub relative_position: Vector3<f32>,
    /// Unit forward vector of the observer in world space
    pub observer_forward: Vector3<f32>,
    /// Cosine of the angle between `observer_forward` and
    /// `relative_position`. 1 when the two positions coincide.
    pub dot: f32,
    pub distance_squared: f32,
    pub now: f64,
    /// When the entity was last sent to this connection
    pub last_updated: Option<f64>,
    /// When a filter last judged the entity for this connection
    pub last_considered: Option<f64>,
    pub last_result: Option<bool>,
}

/// Decides whether an entity is worth replicating to one connection.
pub trait InterestFilter {
    fn filter(&self, params: &RelevanceParams) -> bool;

    /// A verdict younger than this many seconds is reused without calling
    /// `filter` again.
    fn reconsider_interval(&self) -> f64 {
        0.0
    }
}

/// Everything is relevant
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl InterestFilter for AcceptAll {
    fn filter(&self, _params: &RelevanceParams) -> bool {
        true
    }
}

/// Entities further away than `max_distance` are not relevant. Verdicts are
/// kept for `reconsider_interval` seconds so entities on the border do not
/// flicker in and out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceFilter {
    pub max_distance: f32,
    pub reconsider_interval: f64,
}

impl DistanceFilter {
    pub fn new(max_distance: f32) -> Self {
        Self {
            max_distance,
            reconsider_interval: 0.0,
        }
    }

    pub fn with_reconsider_interval(mut self, seconds: f64) -> Self {
        self.reconsider_interval = seconds;
        self
    }
}

impl InterestFilter for DistanceFilter {
    fn filter(&self, params: &RelevanceParams) -> bool {
        params.distance_squared <= self.max_distance * self.max_distance
    }

    fn reconsider_interval(&self) -> f64 {
        self.reconsider_interval
    }
}

/// Entities in front of the observer, within the cone whose half angle has
/// cosine `min_dot`. Anything closer than `near_distance` is relevant
/// whatever its direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldOfViewFilter {
    pub min_dot: f32,
    pub near_distance: f32,
}

impl FieldOfViewFilter {
    /// `half_angle` in radians
    pub fn from_half_angle(half_angle: f32, near_distance: f32) -> Self {
        Self {
            min_dot: half_angle.cos(),
            near_distance,
        }
    }
}

impl InterestFilter for FieldOfViewFilter {
    fn filter(&self, params: &RelevanceParams) -> bool {
        params.distance_squared <= self.near_distance * self.near_distance
            || params.dot >= self.min_dot
    }
}

/// Relevant only when every child filter agrees
#[derive(Default)]
pub struct AllFilters {
    filters: Vec<Box<dyn InterestFilter>>,
}

impl AllFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: Box<dyn InterestFilter>) -> Self {
        self.filters.push(filter);
        self
    }
}

impl InterestFilter for AllFilters {
    fn filter(&self, params: &RelevanceParams) -> bool {
        self.filters.iter().all(|filter| filter.filter(params))
    }

    fn reconsider_interval(&self) -> f64 {
        self.filters
            .iter()
            .map(|filter| filter.reconsider_interval())
            .fold(None, |min: Option<f64>, interval| {
                Some(min.map_or(interval, |min| min.min(interval)))
            })
            .unwrap_or(0.0)
    }
}
