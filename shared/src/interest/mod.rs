mod filters;
mod interest_manager;
mod observer;
mod prioritizer;
mod spatial;

pub use filters::{
    AcceptAll, AllFilters, DistanceFilter, FieldOfViewFilter, InterestFilter, RelevanceParams,
};
pub use interest_manager::{InterestManager, RelevanceRecord};
pub use observer::Observer;
pub use prioritizer::{
    DefaultEntityPrioritizer, EntityPrioritizer, EntityPriority, DEFAULT_RELEVANCE,
    MIN_DISTANCE_SQUARED, PHYSICS_RELEVANCE,
};
pub use spatial::{ComponentSpatialSource, SpatialSource};
