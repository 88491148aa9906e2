//! Purpose: Contract between the marshalling layer and a routing engine.
//! Exports: `RoutingEngine`, `Status`, parameter types, `EngineConfig`, `mock`.
//! Role: The only seam through which requests reach an engine implementation.
//! Invariants: Every operation fills `result` and returns a status; failures are
//! described inside the result tree, never by panicking.
//! Invariants: Implementations are `Send + Sync` so one handle serves concurrent reads.

pub mod config;
pub mod mock;
pub mod params;

pub use config::{Algorithm, EngineConfig};
pub use params::{
    AnnotationsType, Approach, Bearing, Coordinate, FallbackCoordinateType, GapsType,
    GeometryType, Hint, MatchParameters, NearestParameters, OverviewType, RouteParameters,
    TableParameters, TripDestination, TripParameters, TripSource,
};

use crate::json::Object;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,
    Error,
}

pub trait RoutingEngine: Send + Sync {
    fn table(&self, params: &TableParameters, result: &mut Object) -> Status;
    fn route(&self, params: &RouteParameters, result: &mut Object) -> Status;
    fn r#match(&self, params: &MatchParameters, result: &mut Object) -> Status;
    fn trip(&self, params: &TripParameters, result: &mut Object) -> Status;
    fn nearest(&self, params: &NearestParameters, result: &mut Object) -> Status;
}
