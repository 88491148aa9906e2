//! Purpose: Structured parameter objects accepted by the five engine operations.
//! Exports: Parameter structs, per-field enums, `Coordinate`, `Bearing`, `Hint`.
//! Role: Typed counterpart of the flat C inputs; built by `request::*`.
//! Invariants: Enum discriminants equal the numeric tags used on the C boundary.
//! Invariants: Correlated vectors are either empty or one entry per coordinate.
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

const HINT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// Allowed travel direction at a waypoint, in degrees.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(C)]
pub struct Bearing {
    pub bearing: i16,
    pub range: i16,
}

/// Opaque snapped-location token. Bytes are never inspected, only carried.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hint(Vec<u8>);

impl Hint {
    pub fn from_base64(encoded: &[u8]) -> Result<Self, base64::DecodeError> {
        HINT_BASE64.decode(encoded).map(Hint)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Hint(bytes)
    }

    pub fn to_base64(&self) -> String {
        HINT_BASE64.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

macro_rules! tagged_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $tag:literal => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        pub enum $name {
            $($variant = $tag),+
        }

        impl $name {
            pub fn from_tag(tag: i32) -> Option<Self> {
                match tag {
                    $($tag => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn tag(self) -> i32 {
                self as i32
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }
    };
}

tagged_enum! {
    GeometryType {
        Polyline = 0 => "polyline",
        Polyline6 = 1 => "polyline6",
        GeoJson = 2 => "geojson",
    }
}

tagged_enum! {
    /// Detail level of the overview geometry; `False` omits it.
    OverviewType {
        Simplified = 0 => "simplified",
        Full = 1 => "full",
        False = 2 => "false",
    }
}

tagged_enum! {
    GapsType {
        Split = 0 => "split",
        Ignore = 1 => "ignore",
    }
}

tagged_enum! {
    AnnotationsType {
        None = 0 => "none",
        Duration = 1 => "duration",
        Distance = 2 => "distance",
        All = 3 => "duration,distance",
    }
}

tagged_enum! {
    /// Which location feeds the crow-flies fallback when no route exists.
    FallbackCoordinateType {
        Input = 0 => "input",
        Snapped = 1 => "snapped",
    }
}

tagged_enum! {
    /// Side of the road a waypoint may be approached from.
    Approach {
        Curb = 0 => "curb",
        Unrestricted = 1 => "unrestricted",
        Opposite = 2 => "opposite",
    }
}

tagged_enum! {
    TripSource {
        Any = 0 => "any",
        First = 1 => "first",
    }
}

tagged_enum! {
    TripDestination {
        Any = 0 => "any",
        Last = 1 => "last",
    }
}

impl AnnotationsType {
    pub fn wants_duration(self) -> bool {
        matches!(self, AnnotationsType::Duration | AnnotationsType::All)
    }

    pub fn wants_distance(self) -> bool {
        matches!(self, AnnotationsType::Distance | AnnotationsType::All)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableParameters {
    pub coordinates: Vec<Coordinate>,
    pub sources: Vec<usize>,
    pub destinations: Vec<usize>,
    pub annotations: AnnotationsType,
    pub fallback_speed: Option<f64>,
    pub fallback_coordinate_type: FallbackCoordinateType,
    pub scale_factor: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteParameters {
    pub coordinates: Vec<Coordinate>,
    pub geometries: GeometryType,
    pub overview: OverviewType,
    pub alternatives: bool,
    pub steps: bool,
    pub annotations: bool,
    pub continue_straight: bool,
    pub generate_hints: bool,
    pub skip_waypoints: bool,
    pub exclude: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchParameters {
    pub coordinates: Vec<Coordinate>,
    pub geometries: GeometryType,
    pub overview: OverviewType,
    pub timestamps: Vec<u64>,
    pub gaps: GapsType,
    pub waypoints: Vec<usize>,
    pub tidy: bool,
    pub steps: bool,
    pub annotations: bool,
    pub generate_hints: bool,
    pub bearings: Vec<Option<Bearing>>,
    pub radiuses: Vec<Option<f64>>,
    pub hints: Vec<Option<Hint>>,
    pub approaches: Vec<Approach>,
    pub exclude: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TripParameters {
    pub coordinates: Vec<Coordinate>,
    pub geometries: GeometryType,
    pub overview: OverviewType,
    pub source: TripSource,
    pub destination: TripDestination,
    pub roundtrip: bool,
    pub steps: bool,
    pub annotations: bool,
    pub generate_hints: bool,
    pub skip_waypoints: bool,
}

impl TripParameters {
    /// Engine defaults for a bare coordinate list.
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self {
            coordinates,
            geometries: GeometryType::Polyline,
            overview: OverviewType::Simplified,
            source: TripSource::Any,
            destination: TripDestination::Any,
            roundtrip: true,
            steps: false,
            annotations: false,
            generate_hints: true,
            skip_waypoints: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NearestParameters {
    pub coordinate: Coordinate,
    pub number_of_results: u64,
}

#[cfg(test)]
mod tests {
    use super::{AnnotationsType, Approach, GeometryType, Hint, OverviewType};

    #[test]
    fn tags_round_trip_and_reject_unknown() {
        assert_eq!(GeometryType::from_tag(2), Some(GeometryType::GeoJson));
        assert_eq!(GeometryType::GeoJson.tag(), 2);
        assert_eq!(GeometryType::from_tag(3), None);
        assert_eq!(OverviewType::from_tag(-1), None);
        assert_eq!(Approach::from_tag(0), Some(Approach::Curb));
        assert_eq!(AnnotationsType::All.as_str(), "duration,distance");
    }

    #[test]
    fn annotation_selection_flags() {
        assert!(AnnotationsType::All.wants_duration());
        assert!(AnnotationsType::All.wants_distance());
        assert!(!AnnotationsType::Duration.wants_distance());
        assert!(!AnnotationsType::None.wants_duration());
    }

    #[test]
    fn hint_survives_base64_round_trip() {
        let hint = Hint::from_bytes(vec![0xfb, 0xff, 0x00, 0x10, 0x7e]);
        let encoded = hint.to_base64();
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(Hint::from_base64(encoded.as_bytes()).expect("decode"), hint);
    }

    #[test]
    fn hint_accepts_unpadded_input() {
        let padded = Hint::from_base64(b"AQID").expect("padded");
        let unpadded = Hint::from_base64(b"AQI").expect("unpadded");
        assert_eq!(padded.as_bytes(), &[1, 2, 3]);
        assert_eq!(unpadded.as_bytes(), &[1, 2]);
        assert!(Hint::from_base64(b"!!!!").is_err());
    }
}
