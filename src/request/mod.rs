//! Purpose: Turn flat, borrowed inputs into engine parameter objects.
//! Exports: One builder module per operation plus the shared decoding helpers.
//! Role: Validation happens here, so a rejected request never reaches an engine.
//! Invariants: Builders are pure; inputs are only borrowed for the call.
//! Invariants: Unknown enum tags are rejected with the field name in the message.
//! Invariants: A supplied correlated array has exactly one entry per coordinate.
//! Invariants: Coordinates are within lon [-180, 180] and lat [-90, 90]; NaN is out of range.

pub mod r#match;
pub mod nearest;
pub mod route;
pub mod table;
pub mod trip;

use crate::engine::params::{Approach, Coordinate, Hint};
use crate::error::{Error, ErrorKind};

/// Pairs a flat `[lon, lat, lon, lat, ...]` buffer into coordinates.
pub fn decode_coordinates(flat: &[f64]) -> Result<Vec<Coordinate>, Error> {
    if flat.len() % 2 != 0 {
        return Err(Error::new(ErrorKind::Validation)
            .with_message("coordinates length must be even")
            .with_field("coordinates"));
    }
    flat.chunks_exact(2)
        .enumerate()
        .map(|(idx, pair)| {
            let (longitude, latitude) = (pair[0], pair[1]);
            if !in_range(longitude, latitude) {
                return Err(out_of_range(
                    &format!("coordinates[{idx}]"),
                    "coordinates",
                    longitude,
                    latitude,
                ));
            }
            Ok(Coordinate::new(longitude, latitude))
        })
        .collect()
}

/// Single-point form of the coordinate range check.
pub fn decode_point(field: &str, longitude: f64, latitude: f64) -> Result<Coordinate, Error> {
    if !in_range(longitude, latitude) {
        return Err(out_of_range(field, field, longitude, latitude));
    }
    Ok(Coordinate::new(longitude, latitude))
}

fn in_range(longitude: f64, latitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude) && (-90.0..=90.0).contains(&latitude)
}

fn out_of_range(label: &str, field: &str, longitude: f64, latitude: f64) -> Error {
    Error::new(ErrorKind::Validation)
        .with_message(format!(
            "{label} is out of range: longitude {longitude}, latitude {latitude}"
        ))
        .with_field(field)
}

/// Empty means "not supplied"; anything else must match the coordinate count.
pub fn check_correlated(field: &str, len: usize, num_coordinates: usize) -> Result<(), Error> {
    if len > 0 && len != num_coordinates {
        return Err(Error::count_mismatch(field));
    }
    Ok(())
}

pub fn decode_tag<T>(field: &str, tag: i32, from_tag: fn(i32) -> Option<T>) -> Result<T, Error> {
    from_tag(tag).ok_or_else(|| {
        Error::new(ErrorKind::Validation)
            .with_message(format!("invalid {field}: {tag}"))
            .with_field(field)
    })
}

/// Infinite radius means "unconstrained"; finite radii must be non-negative.
pub fn decode_radiuses(radiuses: &[f64]) -> Result<Vec<Option<f64>>, Error> {
    radiuses
        .iter()
        .enumerate()
        .map(|(idx, radius)| {
            if radius.is_infinite() {
                return Ok(None);
            }
            if radius.is_nan() || *radius < 0.0 {
                return Err(Error::new(ErrorKind::Validation)
                    .with_message(format!("radiuses[{idx}] must not be negative"))
                    .with_field("radiuses"));
            }
            Ok(Some(*radius))
        })
        .collect()
}

/// Positional: an empty entry keeps a `None` placeholder for its waypoint.
pub fn decode_hints(hints: &[&[u8]]) -> Result<Vec<Option<Hint>>, Error> {
    hints
        .iter()
        .enumerate()
        .map(|(idx, encoded)| {
            if encoded.is_empty() {
                return Ok(None);
            }
            Hint::from_base64(encoded).map(Some).map_err(|err| {
                Error::new(ErrorKind::Validation)
                    .with_message(format!("hints[{idx}] is not valid base64"))
                    .with_field("hints")
                    .with_source(err)
            })
        })
        .collect()
}

pub fn decode_approaches(approaches: &[u8]) -> Result<Vec<Approach>, Error> {
    approaches
        .iter()
        .map(|tag| decode_tag("approaches", i32::from(*tag), Approach::from_tag))
        .collect()
}

/// Non-positional: empty entries are dropped.
pub fn decode_tags(field: &str, tags: &[&[u8]]) -> Result<Vec<String>, Error> {
    tags.iter()
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            std::str::from_utf8(tag)
                .map(str::to_string)
                .map_err(|err| {
                    Error::new(ErrorKind::Validation)
                        .with_message(format!("{field} entries must be valid UTF-8"))
                        .with_field(field)
                        .with_source(err)
                })
        })
        .collect()
}

/// Non-positive values are the "unset" sentinel.
pub fn positive(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}
