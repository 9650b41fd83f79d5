use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ben-gdf", version, about = "BigEarthNet patch-collection builder")]
pub struct CliArgs {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Raw S1 build, quality filter and metadata enrichment
    BuildRecommendedS1(RecommendedArgs),
    /// Raw S2 build, quality filter and metadata enrichment
    BuildRecommendedS2(RecommendedArgs),
    /// Build the raw S1 collection from an archive directory
    BuildRawS1(BuildArgs),
    /// Build the raw S2 collection from an archive directory
    BuildRawS2(BuildArgs),
    /// Add the full metadata to an S1 parquet file built by this tool
    ExtendS1(ExtendArgs),
    /// Add the full metadata to an S2 parquet file built by this tool
    ExtendS2(ExtendArgs),
    /// Remove snowy, cloudy and unlabelled patches from an S1 or S2 parquet file
    RemoveDiscouraged(RemoveArgs),
}

/// Options shared by every command that scans an archive.
#[derive(Args)]
pub struct BuildArgs {
    /// Archive root holding the patch directories
    pub ben_path: PathBuf,

    /// Output parquet file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file with build options (n_workers, target_crs, progress)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent descriptor workers
    #[arg(long)]
    pub n_workers: Option<usize>,

    /// Target CRS all footprints are reprojected into (e.g., EPSG:3035)
    #[arg(long)]
    pub target_crs: Option<String>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Args)]
pub struct RecommendedArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Directory with the published snow, cloud/shadow and split CSV lists
    #[arg(long)]
    pub reference_dir: PathBuf,

    /// Skip the metadata enrichment stage
    #[arg(long, default_value_t = false)]
    pub skip_metadata: bool,

    /// Directory for intermediate results and the country-border cache
    /// (defaults to the per-user data directory)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExtendArgs {
    /// Parquet file produced by a raw or cleaned build
    pub ben_parquet_path: PathBuf,

    /// File name of the output, written next to the input
    #[arg(long)]
    pub output_name: Option<String>,

    /// Directory with the published snow, cloud/shadow and split CSV lists
    #[arg(long)]
    pub reference_dir: PathBuf,

    /// CRS in which patches are matched against country borders
    #[arg(long)]
    pub target_crs: Option<String>,

    /// Directory caching the country borders (defaults to the per-user data directory)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Parquet file produced by a raw or extended build
    pub ben_parquet_path: PathBuf,

    /// File name of the output, written next to the input
    #[arg(long)]
    pub output_name: Option<String>,

    /// Directory with the published snow, cloud/shadow and split CSV lists
    #[arg(long)]
    pub reference_dir: PathBuf,
}
