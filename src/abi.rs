//! Purpose: C ABI bridge for linking the marshalling layer from C and friends.
//! Exports: `osrm_*` functions, `osrm_result`, `osrm_string`, `osrm_bearing`,
//! `osrm_handle`, `handle_from_engine`.
//! Role: Turns raw pointers into borrowed slices and replies into owned C strings.
//! Invariants: Opaque handles; every returned message is released with `osrm_free_string`.
//! Invariants: Input buffers are only borrowed for the duration of a call.
//! Invariants: A null pointer with a non-zero length is rejected, never dereferenced.
//! Notes: The last construction error lives in a per-thread slot.
#![allow(non_camel_case_types)]

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

use libc::{c_char, c_int};

use crate::engine::{Algorithm, EngineConfig, RoutingEngine};
use crate::error::{Error, ErrorKind};
use crate::logging;
use crate::request::{
    nearest::NearestInput, r#match::MatchInput, route::RouteInput, table::TableInput,
    trip::TripInput,
};
use crate::response::Reply;
use crate::service;

pub use crate::engine::params::Bearing as osrm_bearing;

pub struct osrm_handle {
    engine: Box<dyn RoutingEngine>,
}

#[repr(C)]
#[derive(Debug)]
pub struct osrm_result {
    pub code: c_int,
    pub message: *mut c_char,
}

/// Borrowed byte string; not NUL-terminated.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct osrm_string {
    pub len: usize,
    pub pointer: *const u8,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Wraps an already constructed engine, for Rust callers that bring their own.
pub fn handle_from_engine(engine: Box<dyn RoutingEngine>) -> *mut osrm_handle {
    Box::into_raw(Box::new(osrm_handle { engine }))
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_create(
    base_path: *const c_char,
    algorithm: *const c_char,
) -> *mut osrm_handle {
    logging::init_from_env();
    let opened = catch_unwind(AssertUnwindSafe(|| {
        let path = parse_path(base_path)?;
        let config = EngineConfig::new(path, parse_algorithm(algorithm));
        service::open_engine(&config)
    }));
    let err = match opened {
        Ok(Ok(engine)) => return handle_from_engine(engine),
        Ok(Err(err)) => err,
        Err(_) => Error::new(ErrorKind::Engine).with_message("engine panicked during create"),
    };
    set_last_error(&err.reply_text());
    ptr::null_mut()
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_destroy(handle: *mut osrm_handle) {
    if handle.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(handle));
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_table(
    handle: *const osrm_handle,
    coordinates: *const f64,
    coords_len: usize,
    sources: *const usize,
    num_sources: usize,
    destinations: *const usize,
    num_destinations: usize,
    annotations: c_int,
    fallback_speed: f64,
    fallback_coordinate: c_int,
    scale_factor: f64,
) -> osrm_result {
    with_engine(handle, |engine| {
        let input = TableInput {
            coordinates: borrow_slice(coordinates, coords_len, "coordinates")?,
            sources: borrow_slice(sources, num_sources, "sources")?,
            destinations: borrow_slice(destinations, num_destinations, "destinations")?,
            annotations,
            fallback_speed,
            fallback_coordinate,
            scale_factor,
        };
        service::table(Some(engine), &input)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_route(
    handle: *const osrm_handle,
    coordinates: *const f64,
    coords_len: usize,
    geometry: c_int,
    overview: c_int,
    flags: u8,
    excludes: *const osrm_string,
    num_excludes: usize,
) -> osrm_result {
    with_engine(handle, |engine| {
        let excludes = borrow_strings(excludes, num_excludes, "excludes")?;
        let input = RouteInput {
            coordinates: borrow_slice(coordinates, coords_len, "coordinates")?,
            geometry,
            overview,
            flags,
            excludes: &excludes,
        };
        service::route(Some(engine), &input)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_match(
    handle: *const osrm_handle,
    coordinates: *const f64,
    coords_len: usize,
    geometry: c_int,
    overview: c_int,
    timestamps: *const u64,
    num_timestamps: usize,
    gaps: c_int,
    waypoints: *const usize,
    num_waypoints: usize,
    flags: u8,
    bearings: *const *const osrm_bearing,
    num_bearings: usize,
    radiuses: *const f64,
    num_radiuses: usize,
    hints: *const osrm_string,
    num_hints: usize,
    approaches: *const u8,
    num_approaches: usize,
    excludes: *const osrm_string,
    num_excludes: usize,
) -> osrm_result {
    with_engine(handle, |engine| {
        let bearings = borrow_bearings(bearings, num_bearings)?;
        let hints = borrow_strings(hints, num_hints, "hints")?;
        let excludes = borrow_strings(excludes, num_excludes, "excludes")?;
        let input = MatchInput {
            coordinates: borrow_slice(coordinates, coords_len, "coordinates")?,
            geometry,
            overview,
            timestamps: borrow_slice(timestamps, num_timestamps, "timestamps")?,
            gaps,
            waypoints: borrow_slice(waypoints, num_waypoints, "waypoints")?,
            flags,
            bearings: &bearings,
            radiuses: borrow_slice(radiuses, num_radiuses, "radiuses")?,
            hints: &hints,
            approaches: borrow_slice(approaches, num_approaches, "approaches")?,
            excludes: &excludes,
        };
        service::r#match(Some(engine), &input)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_trip(
    handle: *const osrm_handle,
    coordinates: *const f64,
    coords_len: usize,
) -> osrm_result {
    with_engine(handle, |engine| {
        let input = TripInput::new(borrow_slice(coordinates, coords_len, "coordinates")?);
        service::trip(Some(engine), &input)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_trip_with_options(
    handle: *const osrm_handle,
    coordinates: *const f64,
    coords_len: usize,
    geometry: c_int,
    overview: c_int,
    source: c_int,
    destination: c_int,
    flags: u8,
) -> osrm_result {
    with_engine(handle, |engine| {
        let input = TripInput {
            coordinates: borrow_slice(coordinates, coords_len, "coordinates")?,
            geometry,
            overview,
            source,
            destination,
            flags,
        };
        service::trip(Some(engine), &input)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_nearest(
    handle: *const osrm_handle,
    longitude: f64,
    latitude: f64,
    number: u64,
) -> osrm_result {
    with_engine(handle, |engine| {
        let input = NearestInput {
            longitude,
            latitude,
            number,
        };
        service::nearest(Some(engine), &input)
    })
}

/// Most recent `osrm_create` failure on this thread, or null.
#[unsafe(no_mangle)]
pub extern "C" fn osrm_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(ptr::null(), |message| message.as_ptr())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn osrm_free_string(message: *mut c_char) {
    if message.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(message));
    }
}

fn with_engine(
    handle: *const osrm_handle,
    call: impl FnOnce(&dyn RoutingEngine) -> Result<Reply, Error>,
) -> osrm_result {
    let reply = match borrow_engine(handle) {
        None => Reply::from_error(&service::missing_engine()),
        Some(engine) => call(engine).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "request failed");
            Reply::from_error(&err)
        }),
    };
    into_result(reply)
}

fn borrow_engine<'a>(handle: *const osrm_handle) -> Option<&'a dyn RoutingEngine> {
    if handle.is_null() {
        return None;
    }
    unsafe { Some((*handle).engine.as_ref()) }
}

fn borrow_slice<'a, T>(data: *const T, len: usize, field: &str) -> Result<&'a [T], Error> {
    if len == 0 {
        return Ok(&[]);
    }
    if data.is_null() {
        return Err(Error::new(ErrorKind::Validation)
            .with_message(format!("{field} is null"))
            .with_field(field));
    }
    unsafe { Ok(std::slice::from_raw_parts(data, len)) }
}

fn borrow_strings<'a>(
    strings: *const osrm_string,
    len: usize,
    field: &str,
) -> Result<Vec<&'a [u8]>, Error> {
    borrow_slice(strings, len, field)?
        .iter()
        .enumerate()
        .map(|(idx, item)| borrow_slice(item.pointer, item.len, &format!("{field}[{idx}]")))
        .collect()
}

/// A null entry means "no bearing" for that coordinate.
fn borrow_bearings(
    bearings: *const *const osrm_bearing,
    len: usize,
) -> Result<Vec<Option<osrm_bearing>>, Error> {
    Ok(borrow_slice(bearings, len, "bearings")?
        .iter()
        .map(|entry| {
            if entry.is_null() {
                None
            } else {
                unsafe { Some(**entry) }
            }
        })
        .collect())
}

fn parse_path(base_path: *const c_char) -> Result<String, Error> {
    if base_path.is_null() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("base_path is null")
            .with_field("base_path"));
    }
    unsafe { CStr::from_ptr(base_path) }
        .to_str()
        .map(str::to_string)
        .map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("base_path is not valid UTF-8")
                .with_field("base_path")
                .with_source(err)
        })
}

/// Null or unreadable names fall back to MLD.
fn parse_algorithm(algorithm: *const c_char) -> Algorithm {
    if algorithm.is_null() {
        return Algorithm::default();
    }
    unsafe { CStr::from_ptr(algorithm) }
        .to_str()
        .map(Algorithm::from_name)
        .unwrap_or_default()
}

fn set_last_error(message: &str) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(to_c_string(message)));
}

fn into_result(reply: Reply) -> osrm_result {
    osrm_result {
        code: reply.code as c_int,
        message: to_c_string(&reply.message).into_raw(),
    }
}

/// Interior NULs are dropped rather than truncating the message.
fn to_c_string(input: &str) -> CString {
    let bytes: Vec<u8> = input.bytes().filter(|byte| *byte != 0).collect();
    CString::new(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn take_message(result: osrm_result) -> String {
        assert!(!result.message.is_null());
        let text = unsafe { CStr::from_ptr(result.message) }
            .to_string_lossy()
            .into_owned();
        osrm_free_string(result.message);
        text
    }

    fn last_error() -> Option<String> {
        let ptr = osrm_last_error();
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }

    fn dataset_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"name":"unit","algorithm":"MLD","bounds":[0.0,0.0,10.0,10.0]}}"#
        )
        .expect("write dataset");
        file
    }

    #[test]
    fn null_handle_reports_instance_not_found() {
        let coords = [1.0, 2.0, 3.0, 4.0];
        let result = osrm_trip(ptr::null(), coords.as_ptr(), coords.len());
        assert_eq!(result.code, 1);
        assert_eq!(take_message(result), "OSRM instance not found");
    }

    #[test]
    fn free_string_accepts_null() {
        osrm_free_string(ptr::null_mut());
        osrm_destroy(ptr::null_mut());
    }

    #[test]
    fn interior_nul_is_dropped() {
        let text = to_c_string("bad\0value");
        assert_eq!(text.as_bytes(), b"badvalue");
    }

    #[test]
    fn null_buffer_with_length_is_rejected() {
        let file = dataset_file();
        let path = CString::new(file.path().to_string_lossy().as_bytes()).expect("path");
        let handle = osrm_create(path.as_ptr(), ptr::null());
        assert!(!handle.is_null());
        let result = osrm_route(handle, ptr::null(), 4, 0, 0, 0, ptr::null(), 0);
        assert_eq!(result.code, 1);
        assert_eq!(take_message(result), "coordinates is null");
        osrm_destroy(handle);
    }

    #[test]
    fn create_failure_sets_last_error_and_success_keeps_it() {
        let missing = CString::new("/nonexistent/osrm-marshal/dataset.json").expect("path");
        let mld = CString::new("MLD").expect("alg");
        assert!(osrm_create(missing.as_ptr(), mld.as_ptr()).is_null());
        let first = last_error().expect("last error");
        assert!(first.contains("failed to open dataset"));

        let file = dataset_file();
        let path = CString::new(file.path().to_string_lossy().as_bytes()).expect("path");
        let handle = osrm_create(path.as_ptr(), mld.as_ptr());
        assert!(!handle.is_null());
        assert_eq!(last_error().as_deref(), Some(first.as_str()));
        osrm_destroy(handle);
    }

    #[test]
    fn null_base_path_is_a_construction_failure() {
        assert!(osrm_create(ptr::null(), ptr::null()).is_null());
        assert_eq!(last_error().as_deref(), Some("base_path is null"));
    }

    #[test]
    fn null_bearing_entries_are_absent() {
        let bearing = osrm_bearing {
            bearing: 45,
            range: 10,
        };
        let entries = [&bearing as *const osrm_bearing, ptr::null()];
        let decoded = borrow_bearings(entries.as_ptr(), entries.len()).expect("bearings");
        assert_eq!(decoded, vec![Some(bearing), None]);
    }

    #[test]
    fn string_entries_borrow_their_bytes() {
        let toll = b"toll";
        let entries = [
            osrm_string {
                len: toll.len(),
                pointer: toll.as_ptr(),
            },
            osrm_string {
                len: 0,
                pointer: ptr::null(),
            },
        ];
        let borrowed =
            borrow_strings(entries.as_ptr(), entries.len(), "excludes").expect("strings");
        assert_eq!(borrowed, vec![toll.as_slice(), b"".as_slice()]);

        let broken = [osrm_string {
            len: 3,
            pointer: ptr::null(),
        }];
        let err = borrow_strings(broken.as_ptr(), 1, "hints").expect_err("null entry");
        assert_eq!(err.reply_text(), "hints[0] is null");
    }
}
