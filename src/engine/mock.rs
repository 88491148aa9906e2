//! Purpose: Deterministic engine driver backed by a small dataset manifest.
//! Exports: `MockEngine`, `Dataset`.
//! Role: Default driver behind `osrm_create`, the CLI and the test-suite; it
//! fabricates response trees in the engine's public shapes without routing.
//! Invariants: Output depends only on the manifest, the config and the request.
//! Invariants: Every failure is reported as a `{code, message}` tree with `Status::Error`.
//! Notes: Distances are great-circle, durations use the manifest speed.
use std::fs;

use serde::Deserialize;

use super::config::{Algorithm, EngineConfig};
use super::params::{
    Coordinate, GapsType, GeometryType, Hint, MatchParameters, NearestParameters, OverviewType,
    RouteParameters, TableParameters, TripDestination, TripParameters, TripSource,
};
use super::{RoutingEngine, Status};
use crate::error::{Error, ErrorKind};
use crate::json::{Array, Object, Value};

const EARTH_RADIUS_M: f64 = 6_372_797.560856;
const MATCH_GAP_SECONDS: u64 = 60;
const MAX_NEAREST_CANDIDATES: u64 = 50;
const NEAREST_SPACING_M: f64 = 10.0;

/// Dataset manifest stored at the configured storage path.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub algorithm: String,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    pub bounds: [f64; 4],
    #[serde(default = "default_speed_kmh")]
    pub speed_kmh: f64,
    #[serde(default = "default_street")]
    pub street: String,
    #[serde(default = "default_excludable")]
    pub excludable: Vec<String>,
}

fn default_speed_kmh() -> f64 {
    50.0
}

fn default_street() -> String {
    "Main Street".to_string()
}

fn default_excludable() -> Vec<String> {
    ["toll", "motorway", "ferry"]
        .iter()
        .map(|class| class.to_string())
        .collect()
}

impl Dataset {
    fn contains(&self, coordinate: &Coordinate) -> bool {
        let [min_lon, min_lat, max_lon, max_lat] = self.bounds;
        (min_lon..=max_lon).contains(&coordinate.longitude)
            && (min_lat..=max_lat).contains(&coordinate.latitude)
    }
}

#[derive(Debug)]
pub struct MockEngine {
    dataset: Dataset,
    config: EngineConfig,
}

impl MockEngine {
    /// Loads the manifest named by `config.storage_path`.
    pub fn open(config: &EngineConfig) -> Result<Self, Error> {
        config.validate()?;
        let path = &config.storage_path;
        let text = fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Construction)
                .with_message(format!("failed to open dataset {}", path.display()))
                .with_source(err)
        })?;
        let dataset: Dataset = serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Construction)
                .with_message(format!("dataset {} is malformed", path.display()))
                .with_source(err)
        })?;
        let engine = Self::new(dataset, config.clone())?;
        tracing::debug!(
            dataset = %engine.dataset.name,
            algorithm = config.algorithm.as_str(),
            "opened dataset"
        );
        Ok(engine)
    }

    pub fn new(dataset: Dataset, config: EngineConfig) -> Result<Self, Error> {
        let [min_lon, min_lat, max_lon, max_lat] = dataset.bounds;
        if !(min_lon <= max_lon && min_lat <= max_lat) {
            return Err(Error::new(ErrorKind::Construction)
                .with_message(format!("dataset {} has empty bounds", dataset.name)));
        }
        if !dataset.speed_kmh.is_finite() || dataset.speed_kmh <= 0.0 {
            return Err(Error::new(ErrorKind::Construction)
                .with_message(format!("dataset {} has no positive speed", dataset.name)));
        }
        if Algorithm::from_name(&dataset.algorithm) != config.algorithm {
            return Err(Error::new(ErrorKind::Construction).with_message(format!(
                "dataset {} was prepared for {}, not {}",
                dataset.name,
                dataset.algorithm,
                config.algorithm.as_str()
            )));
        }
        Ok(Self { dataset, config })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn speed_mps(&self) -> f64 {
        self.dataset.speed_kmh / 3.6
    }

    fn check_coordinates(&self, coordinates: &[Coordinate], result: &mut Object) -> Status {
        match coordinates.iter().position(|c| !self.dataset.contains(c)) {
            Some(idx) => fail(
                result,
                "NoSegment",
                format!("Could not find a matching segment for coordinate {idx}"),
            ),
            None => Status::Ok,
        }
    }

    fn check_excludes(&self, exclude: &[String], result: &mut Object) -> Status {
        if exclude
            .iter()
            .all(|class| self.dataset.excludable.contains(class))
        {
            Status::Ok
        } else {
            fail(
                result,
                "InvalidValue",
                "Exclude flag combination is not supported.",
            )
        }
    }

    fn waypoint(&self, coordinate: &Coordinate, index: usize, hint: Option<String>) -> Object {
        let mut waypoint = Object::new();
        if let Some(hint) = hint {
            waypoint.insert("hint", hint);
        }
        waypoint.insert("distance", 0.0);
        waypoint.insert("name", self.dataset.street.as_str());
        waypoint.insert("location", location(coordinate));
        waypoint.insert("index", index);
        waypoint
    }

    fn leg(&self, from: &Coordinate, to: &Coordinate, steps: bool, annotations: bool) -> Object {
        let distance = haversine(from, to);
        let duration = distance / self.speed_mps();
        let mut leg = Object::new()
            .with("distance", round1(distance))
            .with("duration", round1(duration))
            .with("weight", round1(duration))
            .with("summary", self.dataset.street.as_str());
        let steps: Array = if steps {
            vec![
                self.step("depart", from, distance, duration),
                self.step("arrive", to, 0.0, 0.0),
            ]
        } else {
            Vec::new()
        };
        leg.insert("steps", steps);
        if annotations {
            leg.insert(
                "annotation",
                Object::new()
                    .with("distance", vec![Value::from(round1(distance))])
                    .with("duration", vec![Value::from(round1(duration))])
                    .with("speed", vec![Value::from(round1(self.speed_mps()))]),
            );
        }
        leg
    }

    fn step(&self, kind: &str, at: &Coordinate, distance: f64, duration: f64) -> Value {
        Object::new()
            .with("distance", round1(distance))
            .with("duration", round1(duration))
            .with("weight", round1(duration))
            .with("name", self.dataset.street.as_str())
            .with("mode", "driving")
            .with(
                "maneuver",
                Object::new()
                    .with("type", kind)
                    .with("location", location(at)),
            )
            .into()
    }

    fn route_object(
        &self,
        coordinates: &[Coordinate],
        geometries: GeometryType,
        overview: OverviewType,
        steps: bool,
        annotations: bool,
    ) -> Object {
        let legs: Vec<Object> = coordinates
            .windows(2)
            .map(|pair| self.leg(&pair[0], &pair[1], steps, annotations))
            .collect();
        let sum = |key: &str| -> f64 {
            legs.iter()
                .filter_map(|leg| leg.get(key).and_then(Value::as_f64))
                .sum()
        };
        let (distance, duration) = (round1(sum("distance")), round1(sum("duration")));
        let mut route = Object::new();
        if let Some(geometry) = geometry(coordinates, geometries, overview) {
            route.insert("geometry", geometry);
        }
        route.insert("legs", legs.into_iter().map(Value::from).collect::<Array>());
        route.insert("distance", distance);
        route.insert("duration", duration);
        route.insert("weight", duration);
        route.insert("weight_name", "routability");
        route
    }
}

impl RoutingEngine for MockEngine {
    fn table(&self, params: &TableParameters, result: &mut Object) -> Status {
        let count = params.coordinates.len();
        if count == 0 {
            return fail(result, "InvalidOptions", "No coordinates given.");
        }
        if exceeds(count, self.config.max_locations_distance_table) {
            return too_big(result, count);
        }
        if let Some(idx) = params.sources.iter().find(|idx| **idx >= count) {
            return fail(
                result,
                "InvalidOptions",
                format!("Source index {idx} is out of bounds for {count} coordinates"),
            );
        }
        if let Some(idx) = params.destinations.iter().find(|idx| **idx >= count) {
            return fail(
                result,
                "InvalidOptions",
                format!("Destination index {idx} is out of bounds for {count} coordinates"),
            );
        }
        if self.check_coordinates(&params.coordinates, result) == Status::Error {
            return Status::Error;
        }

        let all: Vec<usize> = (0..count).collect();
        let sources = if params.sources.is_empty() {
            &all
        } else {
            &params.sources
        };
        let destinations = if params.destinations.is_empty() {
            &all
        } else {
            &params.destinations
        };
        let scale = params.scale_factor.unwrap_or(1.0);
        let snapped = |indices: &[usize]| -> Array {
            indices
                .iter()
                .map(|idx| {
                    let coordinate = &params.coordinates[*idx];
                    Value::from(self.waypoint(coordinate, *idx, Some(make_hint(*idx, coordinate))))
                })
                .collect()
        };

        result.insert("code", "Ok");
        if params.annotations.wants_duration() {
            let speed = self.speed_mps();
            let durations = matrix(&params.coordinates, sources, destinations, |a, b| {
                haversine(a, b) / speed * scale
            });
            result.insert("durations", durations);
        }
        if params.annotations.wants_distance() {
            let distances = matrix(&params.coordinates, sources, destinations, haversine);
            result.insert("distances", distances);
        }
        result.insert("sources", snapped(sources));
        result.insert("destinations", snapped(destinations));
        Status::Ok
    }

    fn route(&self, params: &RouteParameters, result: &mut Object) -> Status {
        let count = params.coordinates.len();
        if count < 2 {
            return fail(
                result,
                "InvalidOptions",
                "Number of coordinates needs to be at least two.",
            );
        }
        if exceeds(count, self.config.max_locations_viaroute) {
            return too_big(result, count);
        }
        if self.check_excludes(&params.exclude, result) == Status::Error
            || self.check_coordinates(&params.coordinates, result) == Status::Error
        {
            return Status::Error;
        }

        let route = self.route_object(
            &params.coordinates,
            params.geometries,
            params.overview,
            params.steps,
            params.annotations,
        );
        result.insert("code", "Ok");
        result.insert("routes", vec![Value::from(route)]);
        if !params.skip_waypoints {
            let waypoints: Array = params
                .coordinates
                .iter()
                .enumerate()
                .map(|(idx, c)| {
                    let hint = params.generate_hints.then(|| make_hint(idx, c));
                    self.waypoint(c, idx, hint).into()
                })
                .collect();
            result.insert("waypoints", waypoints);
        }
        Status::Ok
    }

    fn r#match(&self, params: &MatchParameters, result: &mut Object) -> Status {
        let count = params.coordinates.len();
        if count < 2 {
            return fail(
                result,
                "InvalidOptions",
                "Number of coordinates needs to be at least two.",
            );
        }
        if exceeds(count, self.config.max_locations_map_matching) {
            return too_big(result, count);
        }
        if params.timestamps.windows(2).any(|pair| pair[1] < pair[0]) {
            return fail(
                result,
                "InvalidValue",
                "Timestamps need to be monotonically increasing.",
            );
        }
        if !params.waypoints.is_empty()
            && (params.waypoints.first() != Some(&0)
                || params.waypoints.last() != Some(&(count - 1))
                || params.waypoints.iter().any(|idx| *idx >= count))
        {
            return fail(
                result,
                "InvalidValue",
                "First and last coordinates must be specified as waypoints.",
            );
        }
        if self.check_excludes(&params.exclude, result) == Status::Error
            || self.check_coordinates(&params.coordinates, result) == Status::Error
        {
            return Status::Error;
        }

        let mut tracepoints: Array = vec![Value::Null; count];
        let mut matchings: Array = Vec::new();
        for segment in split_trace(params) {
            if segment.len() < 2 {
                continue;
            }
            let matchings_index = matchings.len();
            let coordinates = &params.coordinates[segment.clone()];
            let mut matching = self.route_object(
                coordinates,
                params.geometries,
                params.overview,
                params.steps,
                params.annotations,
            );
            matching.insert("confidence", 1.0);
            matchings.push(matching.into());

            for (waypoint_index, idx) in segment.enumerate() {
                let coordinate = &params.coordinates[idx];
                let hint = match params.hints.get(idx) {
                    Some(Some(hint)) => Some(hint.to_base64()),
                    _ => params
                        .generate_hints
                        .then(|| make_hint(idx, coordinate)),
                };
                let mut tracepoint = self.waypoint(coordinate, idx, hint);
                tracepoint.insert("matchings_index", matchings_index);
                tracepoint.insert("waypoint_index", waypoint_index);
                tracepoint.insert("alternatives_count", 0usize);
                tracepoints[idx] = tracepoint.into();
            }
        }
        if matchings.is_empty() {
            return fail(result, "NoMatch", "Could not match the trace.");
        }

        result.insert("code", "Ok");
        result.insert("matchings", matchings);
        result.insert("tracepoints", tracepoints);
        Status::Ok
    }

    fn trip(&self, params: &TripParameters, result: &mut Object) -> Status {
        let count = params.coordinates.len();
        if count < 2 {
            return fail(
                result,
                "InvalidOptions",
                "Number of coordinates needs to be at least two.",
            );
        }
        if exceeds(count, self.config.max_locations_trip) {
            return too_big(result, count);
        }
        if !params.roundtrip
            && (params.source != TripSource::First || params.destination != TripDestination::Last)
        {
            return fail(
                result,
                "NotImplemented",
                "Non-roundtrip trips need source=first and destination=last.",
            );
        }
        if self.check_coordinates(&params.coordinates, result) == Status::Error {
            return Status::Error;
        }

        let mut path = params.coordinates.clone();
        if params.roundtrip {
            path.push(params.coordinates[0]);
        }
        let trip = self.route_object(
            &path,
            params.geometries,
            params.overview,
            params.steps,
            params.annotations,
        );
        result.insert("code", "Ok");
        result.insert("trips", vec![Value::from(trip)]);
        if !params.skip_waypoints {
            let waypoints: Array = params
                .coordinates
                .iter()
                .enumerate()
                .map(|(idx, c)| {
                    let hint = params.generate_hints.then(|| make_hint(idx, c));
                    let mut waypoint = self.waypoint(c, idx, hint);
                    waypoint.insert("trips_index", 0usize);
                    waypoint.insert("waypoint_index", idx);
                    waypoint.into()
                })
                .collect();
            result.insert("waypoints", waypoints);
        }
        Status::Ok
    }

    fn nearest(&self, params: &NearestParameters, result: &mut Object) -> Status {
        let number = params.number_of_results;
        if number == 0 {
            return fail(
                result,
                "InvalidOptions",
                "Number of results must be at least one.",
            );
        }
        if let Some(max) = self.config.max_results_nearest {
            if number > max {
                return fail(
                    result,
                    "TooBig",
                    format!("Number of results {number} is higher than current maximum ({max})"),
                );
            }
        }
        let coordinate = params.coordinate;
        if self.check_coordinates(std::slice::from_ref(&coordinate), result) == Status::Error {
            return Status::Error;
        }

        let waypoints: Array = (0..number.min(MAX_NEAREST_CANDIDATES) as usize)
            .map(|rank| {
                let mut waypoint =
                    self.waypoint(&coordinate, rank, Some(make_hint(rank, &coordinate)));
                waypoint.insert("distance", rank as f64 * NEAREST_SPACING_M);
                waypoint.insert(
                    "nodes",
                    vec![Value::from(rank * 2), Value::from(rank * 2 + 1)],
                );
                waypoint.into()
            })
            .collect();
        result.insert("code", "Ok");
        result.insert("waypoints", waypoints);
        Status::Ok
    }
}

fn fail(result: &mut Object, code: &str, message: impl Into<String>) -> Status {
    result.insert("code", code);
    result.insert("message", message.into());
    Status::Error
}

fn too_big(result: &mut Object, count: usize) -> Status {
    fail(
        result,
        "TooBig",
        format!("Number of entries {count} is higher than current maximum"),
    )
}

fn exceeds(count: usize, limit: Option<usize>) -> bool {
    limit.is_some_and(|max| count > max)
}

/// Row-major `sources x destinations` matrix.
fn matrix(
    coordinates: &[Coordinate],
    sources: &[usize],
    destinations: &[usize],
    cell: impl Fn(&Coordinate, &Coordinate) -> f64,
) -> Array {
    sources
        .iter()
        .map(|s| {
            let row: Array = destinations
                .iter()
                .map(|d| Value::from(round1(cell(&coordinates[*s], &coordinates[*d]))))
                .collect();
            Value::from(row)
        })
        .collect()
}

/// Consecutive coordinate index ranges; splits at large timestamp gaps.
fn split_trace(params: &MatchParameters) -> Vec<std::ops::Range<usize>> {
    let count = params.coordinates.len();
    if params.gaps != GapsType::Split || params.timestamps.is_empty() {
        return vec![0..count];
    }
    let mut segments = Vec::new();
    let mut start = 0;
    for (idx, pair) in params.timestamps.windows(2).enumerate() {
        if pair[1] - pair[0] > MATCH_GAP_SECONDS {
            segments.push(start..idx + 1);
            start = idx + 1;
        }
    }
    segments.push(start..count);
    segments
}

fn location(coordinate: &Coordinate) -> Value {
    vec![
        Value::from(coordinate.longitude),
        Value::from(coordinate.latitude),
    ]
    .into()
}

fn make_hint(index: usize, coordinate: &Coordinate) -> String {
    let mut bytes = Vec::with_capacity(20);
    bytes.extend_from_slice(&(index as u32).to_le_bytes());
    bytes.extend_from_slice(&coordinate.longitude.to_le_bytes());
    bytes.extend_from_slice(&coordinate.latitude.to_le_bytes());
    Hint::from_bytes(bytes).to_base64()
}

fn geometry(
    coordinates: &[Coordinate],
    geometries: GeometryType,
    overview: OverviewType,
) -> Option<Value> {
    let points: Vec<Coordinate> = match overview {
        OverviewType::False => return None,
        OverviewType::Full => coordinates.to_vec(),
        OverviewType::Simplified => match (coordinates.first(), coordinates.last()) {
            (Some(first), Some(last)) if coordinates.len() > 2 => vec![*first, *last],
            _ => coordinates.to_vec(),
        },
    };
    let value = match geometries {
        GeometryType::Polyline => Value::from(encode_polyline(&points, 1e5)),
        GeometryType::Polyline6 => Value::from(encode_polyline(&points, 1e6)),
        GeometryType::GeoJson => Object::new()
            .with("type", "LineString")
            .with("coordinates", points.iter().map(location).collect::<Array>())
            .into(),
    };
    Some(value)
}

fn encode_polyline(points: &[Coordinate], factor: f64) -> String {
    let mut out = String::new();
    let (mut prev_lat, mut prev_lon) = (0i64, 0i64);
    for point in points {
        let lat = (point.latitude * factor).round() as i64;
        let lon = (point.longitude * factor).round() as i64;
        encode_signed(lat - prev_lat, &mut out);
        encode_signed(lon - prev_lon, &mut out);
        prev_lat = lat;
        prev_lon = lon;
    }
    out
}

fn encode_signed(value: i64, out: &mut String) {
    let mut rest = if value < 0 {
        !(value << 1)
    } else {
        value << 1
    } as u64;
    while rest >= 0x20 {
        out.push((((rest & 0x1f) | 0x20) as u8 + 63) as char);
        rest >>= 5;
    }
    out.push((rest as u8 + 63) as char);
}

fn haversine(a: &Coordinate, b: &Coordinate) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
