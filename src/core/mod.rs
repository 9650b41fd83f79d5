//! Core building blocks: footprint geometry, the column-oriented collection,
//! the parallel builder, country assignment, metadata enrichment and the
//! quality filter. These are consumed by the high-level `api` module.
pub mod builder;
pub mod collection;
pub mod country;
pub mod datetime;
pub mod filter;
pub mod geometry;
pub mod labels;
pub mod metadata;
pub mod params;
