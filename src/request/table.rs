//! Purpose: Build `TableParameters` from flat table inputs.
//! Exports: `TableInput`, `build`.
//! Role: Table leg of the request layer.
//! Invariants: Source and destination index lists are independent of the coordinate count.
use super::{decode_coordinates, decode_tag, positive};
use crate::engine::params::{AnnotationsType, FallbackCoordinateType, TableParameters};
use crate::error::Error;

#[derive(Clone, Copy, Debug)]
pub struct TableInput<'a> {
    pub coordinates: &'a [f64],
    /// Indices into the coordinate list; empty means all.
    pub sources: &'a [usize],
    pub destinations: &'a [usize],
    pub annotations: i32,
    /// `<= 0` disables the fallback.
    pub fallback_speed: f64,
    pub fallback_coordinate: i32,
    /// `<= 0` leaves the engine default.
    pub scale_factor: f64,
}

impl<'a> TableInput<'a> {
    pub fn new(coordinates: &'a [f64]) -> Self {
        Self {
            coordinates,
            sources: &[],
            destinations: &[],
            annotations: AnnotationsType::Duration.tag(),
            fallback_speed: 0.0,
            fallback_coordinate: FallbackCoordinateType::Input.tag(),
            scale_factor: 0.0,
        }
    }
}

pub fn build(input: &TableInput<'_>) -> Result<TableParameters, Error> {
    let coordinates = decode_coordinates(input.coordinates)?;
    let annotations = decode_tag("annotations", input.annotations, AnnotationsType::from_tag)?;
    let fallback_speed = positive(input.fallback_speed);
    let fallback_coordinate_type = match fallback_speed {
        Some(_) => decode_tag(
            "fallback_coordinate",
            input.fallback_coordinate,
            FallbackCoordinateType::from_tag,
        )?,
        None => FallbackCoordinateType::Input,
    };
    Ok(TableParameters {
        coordinates,
        sources: input.sources.to_vec(),
        destinations: input.destinations.to_vec(),
        annotations,
        fallback_speed,
        fallback_coordinate_type,
        scale_factor: positive(input.scale_factor),
    })
}

#[cfg(test)]
mod tests {
    use super::{TableInput, build};
    use crate::engine::params::{AnnotationsType, FallbackCoordinateType};

    const COORDS: [f64; 6] = [13.38, 52.51, 13.42, 52.52, 13.45, 52.50];

    #[test]
    fn index_lists_are_not_tied_to_coordinate_count() {
        let input = TableInput {
            sources: &[0],
            destinations: &[0, 1, 2, 1],
            ..TableInput::new(&COORDS)
        };
        let params = build(&input).expect("params");
        assert_eq!(params.coordinates.len(), 3);
        assert_eq!(params.sources, vec![0]);
        assert_eq!(params.destinations, vec![0, 1, 2, 1]);
    }

    #[test]
    fn fallback_and_scale_use_positive_sentinels() {
        let input = TableInput {
            annotations: AnnotationsType::All.tag(),
            fallback_speed: 25.0,
            fallback_coordinate: FallbackCoordinateType::Snapped.tag(),
            scale_factor: 0.0,
            ..TableInput::new(&COORDS)
        };
        let params = build(&input).expect("params");
        assert_eq!(params.annotations, AnnotationsType::All);
        assert_eq!(params.fallback_speed, Some(25.0));
        assert_eq!(
            params.fallback_coordinate_type,
            FallbackCoordinateType::Snapped
        );
        assert_eq!(params.scale_factor, None);
    }

    #[test]
    fn fallback_tag_ignored_without_speed() {
        let input = TableInput {
            fallback_coordinate: 99,
            ..TableInput::new(&COORDS)
        };
        let params = build(&input).expect("params");
        assert_eq!(params.fallback_speed, None);
        assert_eq!(params.fallback_coordinate_type, FallbackCoordinateType::Input);
    }

    #[test]
    fn unknown_annotation_tag_is_rejected() {
        let input = TableInput {
            annotations: 4,
            ..TableInput::new(&COORDS)
        };
        let err = build(&input).expect_err("bad tag");
        assert_eq!(err.reply_text(), "invalid annotations: 4");
    }
}
