//! Command Line Interface (CLI) layer for SWOTMASK.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for the single-date, date-range and
//! merge flows. It wires user-provided options to the library functionality
//! exposed via `swotmask::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
