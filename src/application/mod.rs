//! Application layer containing the checkout orchestration.
//!
//! This module defines the `PaymentOrchestrator`, the single entry point the
//! host application talks to. It sequences the backend and provider calls and
//! turns their failures into a flat result for the UI.

pub mod orchestrator;
