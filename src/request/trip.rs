//! Purpose: Build `TripParameters` for the travelling-salesman operation.
//! Exports: `TripInput`, `build`, `TRIP_*` flag bits.
//! Role: Trip leg of the request layer; plain trips use `TripInput::new`.
use super::{decode_coordinates, decode_tag};
use crate::engine::params::{
    GeometryType, OverviewType, TripDestination, TripParameters, TripSource,
};
use crate::error::Error;

pub const TRIP_STEPS: u8 = 1 << 0;
pub const TRIP_ANNOTATIONS: u8 = 1 << 1;
pub const TRIP_SKIP_HINTS: u8 = 1 << 2;
pub const TRIP_SKIP_WAYPOINTS: u8 = 1 << 3;
pub const TRIP_ROUNDTRIP: u8 = 1 << 4;

/// Flags matching `TripParameters::new`.
pub const TRIP_DEFAULT_FLAGS: u8 = TRIP_ROUNDTRIP;

#[derive(Clone, Copy, Debug)]
pub struct TripInput<'a> {
    pub coordinates: &'a [f64],
    pub geometry: i32,
    pub overview: i32,
    pub source: i32,
    pub destination: i32,
    pub flags: u8,
}

impl<'a> TripInput<'a> {
    pub fn new(coordinates: &'a [f64]) -> Self {
        Self {
            coordinates,
            geometry: GeometryType::Polyline.tag(),
            overview: OverviewType::Simplified.tag(),
            source: TripSource::Any.tag(),
            destination: TripDestination::Any.tag(),
            flags: TRIP_DEFAULT_FLAGS,
        }
    }
}

pub fn build(input: &TripInput<'_>) -> Result<TripParameters, Error> {
    let coordinates = decode_coordinates(input.coordinates)?;
    let flags = input.flags;
    Ok(TripParameters {
        geometries: decode_tag("geometry", input.geometry, GeometryType::from_tag)?,
        overview: decode_tag("overview", input.overview, OverviewType::from_tag)?,
        source: decode_tag("source", input.source, TripSource::from_tag)?,
        destination: decode_tag("destination", input.destination, TripDestination::from_tag)?,
        roundtrip: flags & TRIP_ROUNDTRIP != 0,
        steps: flags & TRIP_STEPS != 0,
        annotations: flags & TRIP_ANNOTATIONS != 0,
        generate_hints: flags & TRIP_SKIP_HINTS == 0,
        skip_waypoints: flags & TRIP_SKIP_WAYPOINTS != 0,
        ..TripParameters::new(coordinates)
    })
}
