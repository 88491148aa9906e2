//! Purpose: Collapse an engine status and result tree into a caller-facing reply.
//! Exports: `Reply`, `ReplyCode`, `unwrap`, `FALLBACK_MESSAGE`.
//! Role: Last step before the ABI copies text out; never fails.
//! Invariants: Success carries the serialized tree; failure carries plain text,
//! never JSON.
use crate::engine::Status;
use crate::error::Error;
use crate::json::{self, Object, Value};

/// Used when an engine reports failure without a usable `message`.
pub const FALLBACK_MESSAGE: &str = "Unknown engine error";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum ReplyCode {
    Ok = 0,
    Error = 1,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reply {
    pub code: ReplyCode,
    pub message: String,
}

impl Reply {
    pub fn ok(message: String) -> Self {
        Self {
            code: ReplyCode::Ok,
            message,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: ReplyCode::Error,
            message: message.into(),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        Self::error(err.reply_text())
    }

    pub fn is_ok(&self) -> bool {
        self.code == ReplyCode::Ok
    }
}

pub fn unwrap(status: Status, result: &Object) -> Reply {
    match status {
        Status::Ok => Reply::ok(json::object_to_string(result)),
        Status::Error => match result.get("message") {
            Some(Value::String(message)) => Reply::error(message.as_str()),
            _ => Reply::error(FALLBACK_MESSAGE),
        },
    }
}
