//! Purpose: `osrm-marshal` CLI entry point for driving the service layer from a shell.
//! Role: Binary crate root; parses args, opens a dataset, runs one request.
//! Invariants: A successful reply is printed verbatim on stdout.
//! Invariants: Failures are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `error::to_exit_code`.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};

use osrm_marshal::engine::params::{
    AnnotationsType, Approach, FallbackCoordinateType, GapsType, GeometryType, OverviewType,
    TripDestination, TripSource,
};
use osrm_marshal::engine::{Algorithm, EngineConfig, RoutingEngine};
use osrm_marshal::error::{Error, ErrorKind, to_exit_code};
use osrm_marshal::logging;
use osrm_marshal::request::{
    r#match::{self as match_request, MatchInput},
    nearest::NearestInput,
    route::{self as route_request, RouteInput},
    table::TableInput,
    trip::{self as trip_request, TripInput},
};
use osrm_marshal::response::Reply;
use osrm_marshal::service;

#[derive(Parser)]
#[command(
    name = "osrm-marshal",
    version,
    about = "Run routing requests against a dataset through the marshalling layer",
    after_help = r#"EXAMPLES
  $ osrm-marshal --data berlin.json route '13.388,52.517;13.397,52.529' --steps
  $ osrm-marshal --data berlin.json table '13.388,52.517;13.397,52.529;13.428,52.523' --annotations all
  $ osrm-marshal --data berlin.json nearest '13.388,52.517' --number 3

Coordinates are `lon,lat` pairs separated by `;`."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, help = "Dataset manifest to open", value_hint = ValueHint::FilePath)]
    data: PathBuf,
    #[arg(long, default_value = "mld", value_enum, help = "Algorithm the dataset was prepared for")]
    algorithm: AlgorithmArg,
    #[arg(short, long, help = "Log request handling to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fastest route through the coordinates in order.
    Route(RouteArgs),
    /// Duration/distance matrix between sources and destinations.
    Table(TableArgs),
    /// Snap a GPS trace onto the road network.
    Match(MatchArgs),
    /// Travelling-salesman round trip over the coordinates.
    Trip(TripArgs),
    /// Nearest road segments to a single point.
    Nearest(NearestArgs),
}

#[derive(Args)]
struct ShapeArgs {
    #[arg(long, default_value = "polyline", value_enum)]
    geometry: GeometryArg,
    #[arg(long, default_value = "simplified", value_enum)]
    overview: OverviewArg,
    #[arg(long)]
    steps: bool,
    #[arg(long)]
    annotations: bool,
    #[arg(long, help = "Leave hints out of the response")]
    no_hints: bool,
}

#[derive(Args)]
struct RouteArgs {
    #[arg(value_parser = parse_coordinates)]
    coordinates: Coordinates,
    #[command(flatten)]
    shape: ShapeArgs,
    #[arg(long)]
    alternatives: bool,
    #[arg(long)]
    continue_straight: bool,
    #[arg(long)]
    skip_waypoints: bool,
    #[arg(long = "exclude", help = "Road class to avoid (repeatable)")]
    excludes: Vec<String>,
}

#[derive(Args)]
struct TableArgs {
    #[arg(value_parser = parse_coordinates)]
    coordinates: Coordinates,
    #[arg(long, value_delimiter = ',')]
    sources: Vec<usize>,
    #[arg(long, value_delimiter = ',')]
    destinations: Vec<usize>,
    #[arg(long, default_value = "duration", value_enum)]
    annotations: AnnotationsArg,
    #[arg(long, help = "Crow-flies speed in m/s used when no route exists")]
    fallback_speed: Option<f64>,
    #[arg(long, default_value = "input", value_enum)]
    fallback_coordinate: FallbackCoordinateArg,
    #[arg(long)]
    scale_factor: Option<f64>,
}

#[derive(Args)]
struct MatchArgs {
    #[arg(value_parser = parse_coordinates)]
    coordinates: Coordinates,
    #[command(flatten)]
    shape: ShapeArgs,
    #[arg(long, value_delimiter = ',')]
    timestamps: Vec<u64>,
    #[arg(long, default_value = "split", value_enum)]
    gaps: GapsArg,
    #[arg(long, value_delimiter = ',')]
    waypoints: Vec<usize>,
    #[arg(long)]
    tidy: bool,
    #[arg(long, value_delimiter = ',', help = "Search radius per coordinate, `inf` for none")]
    radiuses: Vec<f64>,
    #[arg(long, value_delimiter = ',', value_enum)]
    approaches: Vec<ApproachArg>,
    #[arg(long = "exclude")]
    excludes: Vec<String>,
}

#[derive(Args)]
struct TripArgs {
    #[arg(value_parser = parse_coordinates)]
    coordinates: Coordinates,
    #[command(flatten)]
    shape: ShapeArgs,
    #[arg(long, default_value = "any", value_enum)]
    source: TripSourceArg,
    #[arg(long, default_value = "any", value_enum)]
    destination: TripDestinationArg,
    #[arg(long)]
    no_roundtrip: bool,
    #[arg(long)]
    skip_waypoints: bool,
}

#[derive(Args)]
struct NearestArgs {
    #[arg(value_parser = parse_coordinates)]
    coordinate: Coordinates,
    #[arg(long, default_value_t = 1)]
    number: u64,
}

/// Flat `[lon, lat, ...]` buffer, the same shape the C surface takes.
#[derive(Clone, Debug)]
struct Coordinates(Vec<f64>);

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AlgorithmArg {
    Mld,
    Ch,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum GeometryArg {
    Polyline,
    Polyline6,
    Geojson,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OverviewArg {
    Simplified,
    Full,
    False,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AnnotationsArg {
    None,
    Duration,
    Distance,
    All,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FallbackCoordinateArg {
    Input,
    Snapped,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum GapsArg {
    Split,
    Ignore,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ApproachArg {
    Curb,
    Unrestricted,
    Opposite,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TripSourceArg {
    Any,
    First,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TripDestinationArg {
    Any,
    Last,
}

impl AlgorithmArg {
    fn algorithm(self) -> Algorithm {
        match self {
            AlgorithmArg::Mld => Algorithm::Mld,
            AlgorithmArg::Ch => Algorithm::Ch,
        }
    }
}

impl GeometryArg {
    fn tag(self) -> i32 {
        match self {
            GeometryArg::Polyline => GeometryType::Polyline,
            GeometryArg::Polyline6 => GeometryType::Polyline6,
            GeometryArg::Geojson => GeometryType::GeoJson,
        }
        .tag()
    }
}

impl OverviewArg {
    fn tag(self) -> i32 {
        match self {
            OverviewArg::Simplified => OverviewType::Simplified,
            OverviewArg::Full => OverviewType::Full,
            OverviewArg::False => OverviewType::False,
        }
        .tag()
    }
}

impl AnnotationsArg {
    fn tag(self) -> i32 {
        match self {
            AnnotationsArg::None => AnnotationsType::None,
            AnnotationsArg::Duration => AnnotationsType::Duration,
            AnnotationsArg::Distance => AnnotationsType::Distance,
            AnnotationsArg::All => AnnotationsType::All,
        }
        .tag()
    }
}

impl FallbackCoordinateArg {
    fn tag(self) -> i32 {
        match self {
            FallbackCoordinateArg::Input => FallbackCoordinateType::Input,
            FallbackCoordinateArg::Snapped => FallbackCoordinateType::Snapped,
        }
        .tag()
    }
}

impl GapsArg {
    fn tag(self) -> i32 {
        match self {
            GapsArg::Split => GapsType::Split,
            GapsArg::Ignore => GapsType::Ignore,
        }
        .tag()
    }
}

impl ApproachArg {
    fn tag(self) -> u8 {
        let approach = match self {
            ApproachArg::Curb => Approach::Curb,
            ApproachArg::Unrestricted => Approach::Unrestricted,
            ApproachArg::Opposite => Approach::Opposite,
        };
        approach.tag() as u8
    }
}

impl TripSourceArg {
    fn tag(self) -> i32 {
        match self {
            TripSourceArg::Any => TripSource::Any,
            TripSourceArg::First => TripSource::First,
        }
        .tag()
    }
}

impl TripDestinationArg {
    fn tag(self) -> i32 {
        match self {
            TripDestinationArg::Any => TripDestination::Any,
            TripDestinationArg::Last => TripDestination::Last,
        }
        .tag()
    }
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(exit_code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage).with_message(clap_error_summary(&err)));
            }
        },
    };

    logging::init_cli(cli.verbose);
    let config = EngineConfig::new(cli.data, cli.algorithm.algorithm());
    let engine = service::open_engine(&config)?;
    let reply = dispatch_command(cli.command, engine.as_ref())?;
    if !reply.is_ok() {
        return Err(Error::new(ErrorKind::Engine).with_message(reply.message));
    }
    println!("{}", reply.message);
    Ok(0)
}

fn dispatch_command(command: Command, engine: &dyn RoutingEngine) -> Result<Reply, Error> {
    match command {
        Command::Route(args) => {
            let mut flags = shape_flags(
                &args.shape,
                route_request::ROUTE_STEPS,
                route_request::ROUTE_ANNOTATIONS,
                route_request::ROUTE_SKIP_HINTS,
            );
            if args.alternatives {
                flags |= route_request::ROUTE_ALTERNATIVES;
            }
            if args.continue_straight {
                flags |= route_request::ROUTE_CONTINUE_STRAIGHT;
            }
            if args.skip_waypoints {
                flags |= route_request::ROUTE_SKIP_WAYPOINTS;
            }
            let excludes = as_bytes(&args.excludes);
            let input = RouteInput {
                coordinates: &args.coordinates.0,
                geometry: args.shape.geometry.tag(),
                overview: args.shape.overview.tag(),
                flags,
                excludes: &excludes,
            };
            service::route(Some(engine), &input)
        }
        Command::Table(args) => {
            let input = TableInput {
                coordinates: &args.coordinates.0,
                sources: &args.sources,
                destinations: &args.destinations,
                annotations: args.annotations.tag(),
                fallback_speed: args.fallback_speed.unwrap_or(0.0),
                fallback_coordinate: args.fallback_coordinate.tag(),
                scale_factor: args.scale_factor.unwrap_or(0.0),
            };
            service::table(Some(engine), &input)
        }
        Command::Match(args) => {
            let mut flags = shape_flags(
                &args.shape,
                match_request::MATCH_STEPS,
                match_request::MATCH_ANNOTATIONS,
                match_request::MATCH_SKIP_HINTS,
            );
            if args.tidy {
                flags |= match_request::MATCH_TIDY;
            }
            let approaches: Vec<u8> = args.approaches.iter().map(|arg| arg.tag()).collect();
            let excludes = as_bytes(&args.excludes);
            let input = MatchInput {
                timestamps: &args.timestamps,
                gaps: args.gaps.tag(),
                waypoints: &args.waypoints,
                radiuses: &args.radiuses,
                approaches: &approaches,
                excludes: &excludes,
                geometry: args.shape.geometry.tag(),
                overview: args.shape.overview.tag(),
                flags,
                ..MatchInput::new(&args.coordinates.0)
            };
            service::r#match(Some(engine), &input)
        }
        Command::Trip(args) => {
            let mut flags = shape_flags(
                &args.shape,
                trip_request::TRIP_STEPS,
                trip_request::TRIP_ANNOTATIONS,
                trip_request::TRIP_SKIP_HINTS,
            );
            if !args.no_roundtrip {
                flags |= trip_request::TRIP_ROUNDTRIP;
            }
            if args.skip_waypoints {
                flags |= trip_request::TRIP_SKIP_WAYPOINTS;
            }
            let input = TripInput {
                coordinates: &args.coordinates.0,
                geometry: args.shape.geometry.tag(),
                overview: args.shape.overview.tag(),
                source: args.source.tag(),
                destination: args.destination.tag(),
                flags,
            };
            service::trip(Some(engine), &input)
        }
        Command::Nearest(args) => {
            let [longitude, latitude] = args.coordinate.0[..] else {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("nearest takes exactly one coordinate")
                    .with_field("coordinate"));
            };
            let input = NearestInput {
                longitude,
                latitude,
                number: args.number,
            };
            service::nearest(Some(engine), &input)
        }
    }
}

fn shape_flags(shape: &ShapeArgs, steps: u8, annotations: u8, skip_hints: u8) -> u8 {
    let mut flags = 0;
    if shape.steps {
        flags |= steps;
    }
    if shape.annotations {
        flags |= annotations;
    }
    if shape.no_hints {
        flags |= skip_hints;
    }
    flags
}

fn as_bytes(values: &[String]) -> Vec<&[u8]> {
    values.iter().map(|value| value.as_bytes()).collect()
}

fn parse_coordinates(raw: &str) -> Result<Coordinates, String> {
    let mut flat = Vec::new();
    for pair in raw.split(';').filter(|pair| !pair.trim().is_empty()) {
        let (lon, lat) = pair
            .split_once(',')
            .ok_or_else(|| format!("expected `lon,lat`, got `{pair}`"))?;
        for part in [lon, lat] {
            let value = part
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("`{}` is not a number", part.trim()))?;
            flat.push(value);
        }
    }
    if flat.is_empty() {
        return Err("no coordinates given".to_string());
    }
    Ok(Coordinates(flat))
}

fn emit_error(err: &Error) {
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(err.reply_text()));
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
