//! ETA estimation: a physical projection over the route polyline blended
//! with historical arrival averages, anchored on the nearest upcoming stop.

pub mod blend;
pub mod geo;
pub mod history;
pub mod physical;
