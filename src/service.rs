//! Purpose: Run one request end to end: handle check, build, engine call, unwrap.
//! Exports: `open_engine`, `missing_engine`, `table`, `route`, `r#match`, `trip`, `nearest`.
//! Role: Shared by the C ABI and the CLI so both surfaces behave identically.
//! Invariants: `Err` carries layer-side failures; engine-reported failures are
//! `Ok` replies with an error code.
//! Invariants: A missing engine or a rejected request never reaches `RoutingEngine`.
//! Invariants: Panics raised by an engine are contained and reported as replies.
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::engine::mock::MockEngine;
use crate::engine::{EngineConfig, RoutingEngine, Status};
use crate::error::{Error, ErrorKind};
use crate::json::Object;
use crate::request::{
    r#match::{self, MatchInput},
    nearest::{self, NearestInput},
    route::{self, RouteInput},
    table::{self, TableInput},
    trip::{self, TripInput},
};
use crate::response::{self, Reply};

pub const INSTANCE_NOT_FOUND: &str = "OSRM instance not found";

pub fn missing_engine() -> Error {
    Error::new(ErrorKind::InvalidHandle).with_message(INSTANCE_NOT_FOUND)
}

/// Opens the dataset named by `config` with the bundled driver.
pub fn open_engine(config: &EngineConfig) -> Result<Box<dyn RoutingEngine>, Error> {
    config.validate()?;
    match MockEngine::open(config) {
        Ok(engine) => {
            tracing::debug!(
                path = %config.storage_path.display(),
                algorithm = config.algorithm.as_str(),
                "engine opened"
            );
            Ok(Box::new(engine))
        }
        Err(err) => {
            tracing::error!(
                path = %config.storage_path.display(),
                error = %err,
                "engine construction failed"
            );
            Err(err)
        }
    }
}

pub fn table(engine: Option<&dyn RoutingEngine>, input: &TableInput<'_>) -> Result<Reply, Error> {
    dispatch(
        "table",
        engine,
        input.coordinates.len() / 2,
        || table::build(input),
        |engine, params, result| engine.table(params, result),
    )
}

pub fn route(engine: Option<&dyn RoutingEngine>, input: &RouteInput<'_>) -> Result<Reply, Error> {
    dispatch(
        "route",
        engine,
        input.coordinates.len() / 2,
        || route::build(input),
        |engine, params, result| engine.route(params, result),
    )
}

pub fn r#match(engine: Option<&dyn RoutingEngine>, input: &MatchInput<'_>) -> Result<Reply, Error> {
    dispatch(
        "match",
        engine,
        input.coordinates.len() / 2,
        || r#match::build(input),
        |engine, params, result| engine.r#match(params, result),
    )
}

pub fn trip(engine: Option<&dyn RoutingEngine>, input: &TripInput<'_>) -> Result<Reply, Error> {
    dispatch(
        "trip",
        engine,
        input.coordinates.len() / 2,
        || trip::build(input),
        |engine, params, result| engine.trip(params, result),
    )
}

pub fn nearest(engine: Option<&dyn RoutingEngine>, input: &NearestInput) -> Result<Reply, Error> {
    dispatch(
        "nearest",
        engine,
        1,
        || nearest::build(input),
        |engine, params, result| engine.nearest(params, result),
    )
}

fn dispatch<P>(
    op: &'static str,
    engine: Option<&dyn RoutingEngine>,
    coordinates: usize,
    build: impl FnOnce() -> Result<P, Error>,
    call: impl FnOnce(&dyn RoutingEngine, &P, &mut Object) -> Status,
) -> Result<Reply, Error> {
    let Some(engine) = engine else {
        tracing::warn!(op, "request on a null handle");
        return Err(missing_engine());
    };
    let params = build().inspect_err(|err| {
        tracing::warn!(op, error = %err, "request rejected");
    })?;
    tracing::debug!(op, coordinates, "dispatching to engine");

    let mut result = Object::new();
    let status = match catch_unwind(AssertUnwindSafe(|| call(engine, &params, &mut result))) {
        Ok(status) => status,
        Err(_) => {
            tracing::error!(op, "engine panicked");
            return Err(Error::new(ErrorKind::Engine)
                .with_message(format!("engine panicked during {op}")));
        }
    };
    let reply = response::unwrap(status, &result);
    if !reply.is_ok() {
        tracing::warn!(op, message = %reply.message, "engine reported failure");
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        MatchParameters, NearestParameters, RouteParameters, TableParameters, TripParameters,
    };
    use crate::response::ReplyCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Scripted {
        calls: AtomicUsize,
    }

    impl Scripted {
        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RoutingEngine for Scripted {
        fn table(&self, _: &TableParameters, result: &mut Object) -> Status {
            self.hit();
            result.insert("code", "Ok");
            Status::Ok
        }

        fn route(&self, params: &RouteParameters, result: &mut Object) -> Status {
            self.hit();
            result.insert("code", "Ok");
            result.insert("steps", params.steps);
            Status::Ok
        }

        fn r#match(&self, _: &MatchParameters, result: &mut Object) -> Status {
            self.hit();
            result.insert("code", "NoMatch");
            Status::Error
        }

        fn trip(&self, _: &TripParameters, _: &mut Object) -> Status {
            self.hit();
            panic!("trip blew up");
        }

        fn nearest(&self, _: &NearestParameters, result: &mut Object) -> Status {
            self.hit();
            result.insert("code", "Ok");
            Status::Ok
        }
    }

    const COORDS: [f64; 4] = [1.0, 2.0, 3.0, 4.0];

    #[test]
    fn null_engine_is_reported_before_validation() {
        let err = route(None, &RouteInput::new(&COORDS[..3])).expect_err("null engine");
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
        assert_eq!(Reply::from_error(&err).message, INSTANCE_NOT_FOUND);
    }

    #[test]
    fn rejected_request_does_not_call_engine() {
        let engine = Scripted::default();
        let input = TableInput {
            annotations: 9,
            ..TableInput::new(&COORDS)
        };
        let err = table(Some(&engine), &input).expect_err("bad tag");
        assert_eq!(err.reply_text(), "invalid annotations: 9");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn success_carries_serialized_tree() {
        let engine = Scripted::default();
        let input = RouteInput {
            flags: route::ROUTE_STEPS,
            ..RouteInput::new(&COORDS)
        };
        let reply = route(Some(&engine), &input).expect("reply");
        assert_eq!(reply.code, ReplyCode::Ok);
        assert_eq!(reply.message, r#"{"code":"Ok","steps":true}"#);
    }

    #[test]
    fn engine_failure_without_message_uses_fallback() {
        let engine = Scripted::default();
        let reply = r#match(Some(&engine), &MatchInput::new(&COORDS)).expect("reply");
        assert_eq!(reply.code, ReplyCode::Error);
        assert_eq!(reply.message, response::FALLBACK_MESSAGE);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn engine_panic_becomes_error_reply() {
        let engine = Scripted::default();
        let err = trip(Some(&engine), &TripInput::new(&COORDS)).expect_err("panic");
        assert_eq!(err.kind(), ErrorKind::Engine);
        assert_eq!(err.reply_text(), "engine panicked during trip");
    }

    #[test]
    fn open_engine_reports_missing_dataset() {
        let config = EngineConfig::new("/nonexistent/osrm-marshal.json", Default::default());
        let err = open_engine(&config).err().expect("missing dataset");
        assert_eq!(err.kind(), ErrorKind::Construction);
    }
}
