//! I/O layer: patch descriptors, archive directory scanning, the published
//! reference lists, country boundaries and Parquet persistence.
pub mod borders;
pub use self::borders::{BoundaryCollection, BoundaryProvider, NaturalEarthBoundaries, StaticBoundaries};

pub mod descriptor;
pub mod directories;

pub mod parquet;
pub use self::parquet::{read_collection, write_collection};

pub mod reference;
pub use self::reference::ReferenceData;
