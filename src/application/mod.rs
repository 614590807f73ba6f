//! Application layer containing the dispatch orchestration.
//!
//! This module defines the `DispatchEngine`, the primary entry point for
//! batch dispatch, single-record resend, and bulk reset. Each run owns an
//! explicit `DispatchSession` so cancellation and progress never leak
//! across runs.

pub mod engine;
pub mod session;
