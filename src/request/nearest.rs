//! Purpose: Build `NearestParameters` for a single query point.
//! Exports: `NearestInput`, `build`.
//! Role: Nearest leg of the request layer.
//! Notes: Result-count limits are the engine's to enforce.
use super::decode_point;
use crate::engine::params::NearestParameters;
use crate::error::Error;

#[derive(Clone, Copy, Debug)]
pub struct NearestInput {
    pub longitude: f64,
    pub latitude: f64,
    pub number: u64,
}

pub fn build(input: &NearestInput) -> Result<NearestParameters, Error> {
    Ok(NearestParameters {
        coordinate: decode_point("coordinate", input.longitude, input.latitude)?,
        number_of_results: input.number,
    })
}
