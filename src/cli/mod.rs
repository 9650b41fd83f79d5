//! Command Line Interface (CLI) layer for `ben-gdf`.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the dispatch logic (`runner`) for the raw, recommended, extend and
//! remove-discouraged commands. It wires user-provided options to the
//! library functionality exposed via `ben_gdf_builder::api`.
//!
//! If you are embedding the builder into another application, prefer using
//! the high-level `ben_gdf_builder::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
