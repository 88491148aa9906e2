//! Purpose: Build `RouteParameters` from flat route inputs and a flag byte.
//! Exports: `RouteInput`, `build`, `ROUTE_*` flag bits.
//! Role: Route leg of the request layer.
//! Notes: Unused high flag bits are ignored.
use super::{decode_coordinates, decode_tag, decode_tags};
use crate::engine::params::{GeometryType, OverviewType, RouteParameters};
use crate::error::Error;

pub const ROUTE_ALTERNATIVES: u8 = 1 << 0;
pub const ROUTE_STEPS: u8 = 1 << 1;
pub const ROUTE_ANNOTATIONS: u8 = 1 << 2;
pub const ROUTE_CONTINUE_STRAIGHT: u8 = 1 << 3;
pub const ROUTE_SKIP_HINTS: u8 = 1 << 4;
pub const ROUTE_SKIP_WAYPOINTS: u8 = 1 << 5;

#[derive(Clone, Copy, Debug)]
pub struct RouteInput<'a> {
    pub coordinates: &'a [f64],
    pub geometry: i32,
    pub overview: i32,
    pub flags: u8,
    pub excludes: &'a [&'a [u8]],
}

impl<'a> RouteInput<'a> {
    pub fn new(coordinates: &'a [f64]) -> Self {
        Self {
            coordinates,
            geometry: GeometryType::Polyline.tag(),
            overview: OverviewType::Simplified.tag(),
            flags: 0,
            excludes: &[],
        }
    }
}

pub fn build(input: &RouteInput<'_>) -> Result<RouteParameters, Error> {
    let coordinates = decode_coordinates(input.coordinates)?;
    let flags = input.flags;
    Ok(RouteParameters {
        coordinates,
        geometries: decode_tag("geometry", input.geometry, GeometryType::from_tag)?,
        overview: decode_tag("overview", input.overview, OverviewType::from_tag)?,
        alternatives: flags & ROUTE_ALTERNATIVES != 0,
        steps: flags & ROUTE_STEPS != 0,
        annotations: flags & ROUTE_ANNOTATIONS != 0,
        continue_straight: flags & ROUTE_CONTINUE_STRAIGHT != 0,
        generate_hints: flags & ROUTE_SKIP_HINTS == 0,
        skip_waypoints: flags & ROUTE_SKIP_WAYPOINTS != 0,
        exclude: decode_tags("excludes", input.excludes)?,
    })
}
