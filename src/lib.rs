//! Purpose: Marshalling layer between a flat C calling convention and a routing engine.
//! Exports: `abi` (C surface), `service`, `request`, `response`, `engine`, `json`, `error`, `logging`.
//! Role: Library backing the `osrm-marshal` cdylib/staticlib and CLI.
//! Invariants: Requests are validated before any engine call.
//! Invariants: Every reply is either compact JSON (code 0) or plain text (code 1).
pub mod abi;
pub mod engine;
pub mod error;
pub mod json;
pub mod logging;
pub mod request;
pub mod response;
pub mod service;
