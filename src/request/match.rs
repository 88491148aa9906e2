//! Purpose: Build `MatchParameters` from a GPS trace and its per-point options.
//! Exports: `MatchInput`, `build`, `MATCH_*` flag bits.
//! Role: Match leg of the request layer; the only builder with correlated arrays.
//! Invariants: Timestamps, bearings, radiuses, hints and approaches are empty or
//! one per coordinate; waypoints and excludes are free-length.
//! Invariants: Timestamps never decrease; supplied waypoints start at the first
//! coordinate, end at the last and stay in bounds.
use super::{
    check_correlated, decode_approaches, decode_coordinates, decode_hints, decode_radiuses,
    decode_tag, decode_tags,
};
use crate::engine::params::{Bearing, GapsType, GeometryType, MatchParameters, OverviewType};
use crate::error::{Error, ErrorKind};

pub const MATCH_TIDY: u8 = 1 << 0;
pub const MATCH_STEPS: u8 = 1 << 1;
pub const MATCH_ANNOTATIONS: u8 = 1 << 2;
pub const MATCH_SKIP_HINTS: u8 = 1 << 3;

#[derive(Clone, Copy, Debug)]
pub struct MatchInput<'a> {
    pub coordinates: &'a [f64],
    pub geometry: i32,
    pub overview: i32,
    pub timestamps: &'a [u64],
    pub gaps: i32,
    pub waypoints: &'a [usize],
    pub flags: u8,
    pub bearings: &'a [Option<Bearing>],
    pub radiuses: &'a [f64],
    pub hints: &'a [&'a [u8]],
    pub approaches: &'a [u8],
    pub excludes: &'a [&'a [u8]],
}

impl<'a> MatchInput<'a> {
    pub fn new(coordinates: &'a [f64]) -> Self {
        Self {
            coordinates,
            geometry: GeometryType::Polyline.tag(),
            overview: OverviewType::Simplified.tag(),
            timestamps: &[],
            gaps: GapsType::Split.tag(),
            waypoints: &[],
            flags: 0,
            bearings: &[],
            radiuses: &[],
            hints: &[],
            approaches: &[],
            excludes: &[],
        }
    }
}

pub fn build(input: &MatchInput<'_>) -> Result<MatchParameters, Error> {
    let coordinates = decode_coordinates(input.coordinates)?;
    let count = coordinates.len();
    check_correlated("num_timestamps", input.timestamps.len(), count)?;
    check_correlated("num_bearings", input.bearings.len(), count)?;
    check_correlated("num_radiuses", input.radiuses.len(), count)?;
    check_correlated("num_hints", input.hints.len(), count)?;
    check_correlated("num_approaches", input.approaches.len(), count)?;
    check_timestamps(input.timestamps)?;
    check_waypoints(input.waypoints, count)?;

    let flags = input.flags;
    Ok(MatchParameters {
        coordinates,
        geometries: decode_tag("geometry", input.geometry, GeometryType::from_tag)?,
        overview: decode_tag("overview", input.overview, OverviewType::from_tag)?,
        timestamps: input.timestamps.to_vec(),
        gaps: decode_tag("gaps", input.gaps, GapsType::from_tag)?,
        waypoints: input.waypoints.to_vec(),
        tidy: flags & MATCH_TIDY != 0,
        steps: flags & MATCH_STEPS != 0,
        annotations: flags & MATCH_ANNOTATIONS != 0,
        generate_hints: flags & MATCH_SKIP_HINTS == 0,
        bearings: input.bearings.to_vec(),
        radiuses: decode_radiuses(input.radiuses)?,
        hints: decode_hints(input.hints)?,
        approaches: decode_approaches(input.approaches)?,
        exclude: decode_tags("excludes", input.excludes)?,
    })
}

fn check_timestamps(timestamps: &[u64]) -> Result<(), Error> {
    match timestamps.windows(2).position(|pair| pair[1] < pair[0]) {
        Some(idx) => Err(Error::new(ErrorKind::Validation)
            .with_message(format!("timestamps[{}] is earlier than its predecessor", idx + 1))
            .with_field("timestamps")),
        None => Ok(()),
    }
}

fn check_waypoints(waypoints: &[usize], count: usize) -> Result<(), Error> {
    if waypoints.is_empty() {
        return Ok(());
    }
    let invalid = |message: String| {
        Error::new(ErrorKind::Validation)
            .with_message(message)
            .with_field("waypoints")
    };
    if let Some(idx) = waypoints.iter().position(|waypoint| *waypoint >= count) {
        return Err(invalid(format!(
            "waypoints[{idx}] is out of bounds for {count} coordinates"
        )));
    }
    if waypoints.first() != Some(&0) || waypoints.last() != count.checked_sub(1).as_ref() {
        return Err(invalid(
            "waypoints must start at the first coordinate and end at the last".to_string(),
        ));
    }
    Ok(())
}
