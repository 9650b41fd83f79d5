use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Number of workers must be greater than 0, got: {n_workers}")]
    ZeroWorkers { n_workers: usize },

    #[error("Invalid target CRS: {crs}")]
    InvalidCrs { crs: String },

    #[error(transparent)]
    Builder(#[from] ben_gdf_builder::Error),
}
