use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use ben_gdf_builder::api::{
    CLEANED_OUTPUT, EXTENDED_S1_OUTPUT, EXTENDED_S2_OUTPUT, FINAL_S1_OUTPUT, FINAL_S2_OUTPUT,
    RAW_S1_OUTPUT, RAW_S2_OUTPUT,
};
use ben_gdf_builder::{
    BoundaryProvider, BuildOptions, Crs, EnrichmentSources, Modality, NaturalEarthBoundaries,
    RecommendedBuild, ReferenceData, WorkDir, build_raw_ben_s1_parquet, build_raw_ben_s2_parquet,
    build_recommended_s1_parquet, build_recommended_s2_parquet, extend_ben_s1_parquet,
    extend_ben_s2_parquet, remove_discouraged_parquet_entries,
};

use super::args::{BuildArgs, CliArgs, Command, ExtendArgs, RecommendedArgs, RemoveArgs};
use super::errors::AppError;

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn parse_crs(definition: &str) -> Result<Crs, AppError> {
    let crs = Crs::new(definition);
    crs.spatial_ref().map_err(|_| AppError::InvalidCrs {
        crs: definition.to_string(),
    })?;
    Ok(crs)
}

/// Config file first, explicit flags on top.
fn build_options(args: &BuildArgs) -> Result<BuildOptions, AppError> {
    let mut options = match &args.config {
        Some(path) => BuildOptions::from_json_file(path)?,
        None => BuildOptions::default(),
    };
    if let Some(n_workers) = args.n_workers {
        if n_workers == 0 {
            return Err(AppError::ZeroWorkers { n_workers });
        }
        options.n_workers = n_workers;
    }
    if let Some(crs) = &args.target_crs {
        options.target_crs = parse_crs(crs)?;
    }
    if args.no_progress {
        options.progress = false;
    }
    Ok(options)
}

fn work_dir(path: Option<PathBuf>) -> Result<WorkDir, AppError> {
    Ok(match path {
        Some(path) => WorkDir::new(path)?,
        None => WorkDir::user_default()?,
    })
}

fn raw(modality: Modality, args: BuildArgs) -> Result<PathBuf, AppError> {
    let options = build_options(&args)?;
    let written = match modality {
        Modality::S1 => {
            let output = args.output.unwrap_or_else(|| PathBuf::from(RAW_S1_OUTPUT));
            build_raw_ben_s1_parquet(&args.ben_path, &output, &options)?
        }
        Modality::S2 => {
            let output = args.output.unwrap_or_else(|| PathBuf::from(RAW_S2_OUTPUT));
            build_raw_ben_s2_parquet(&args.ben_path, &output, &options)?
        }
    };
    Ok(written)
}

fn recommended(modality: Modality, args: RecommendedArgs) -> Result<PathBuf, AppError> {
    let options = build_options(&args.build)?;
    let reference = ReferenceData::from_dir(&args.reference_dir)?;
    let work_dir = work_dir(args.work_dir)?;
    let borders = NaturalEarthBoundaries::with_cache_dir(work_dir.path());
    let build = RecommendedBuild {
        work_dir: &work_dir,
        options: &options,
        reference: &reference,
        borders: (!args.skip_metadata).then_some(&borders as &dyn BoundaryProvider),
    };

    let ben_path = &args.build.ben_path;
    let written = match modality {
        Modality::S1 => {
            let output = args.build.output.unwrap_or_else(|| PathBuf::from(FINAL_S1_OUTPUT));
            build_recommended_s1_parquet(ben_path, &output, &build)?
        }
        Modality::S2 => {
            let output = args.build.output.unwrap_or_else(|| PathBuf::from(FINAL_S2_OUTPUT));
            build_recommended_s2_parquet(ben_path, &output, &build)?
        }
    };
    Ok(written)
}

fn extend(modality: Modality, args: ExtendArgs) -> Result<PathBuf, AppError> {
    let reference = ReferenceData::from_dir(&args.reference_dir)?;
    let work_dir = work_dir(args.work_dir)?;
    let borders = NaturalEarthBoundaries::with_cache_dir(work_dir.path());
    let crs = match &args.target_crs {
        Some(crs) => parse_crs(crs)?,
        None => Crs::default(),
    };
    let sources = EnrichmentSources {
        reference: &reference,
        borders: &borders,
        crs,
    };

    let written = match modality {
        Modality::S1 => {
            let name = args.output_name.as_deref().unwrap_or(EXTENDED_S1_OUTPUT);
            extend_ben_s1_parquet(&args.ben_parquet_path, name, &sources)?
        }
        Modality::S2 => {
            let name = args.output_name.as_deref().unwrap_or(EXTENDED_S2_OUTPUT);
            extend_ben_s2_parquet(&args.ben_parquet_path, name, &sources)?
        }
    };
    Ok(written)
}

fn remove(args: RemoveArgs) -> Result<PathBuf, AppError> {
    let reference = ReferenceData::from_dir(&args.reference_dir)?;
    let name = args.output_name.as_deref().unwrap_or(CLEANED_OUTPUT);
    Ok(remove_discouraged_parquet_entries(
        &args.ben_parquet_path,
        name,
        &reference,
    )?)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    let written = match args.command {
        Command::BuildRecommendedS1(args) => recommended(Modality::S1, args)?,
        Command::BuildRecommendedS2(args) => recommended(Modality::S2, args)?,
        Command::BuildRawS1(args) => raw(Modality::S1, args)?,
        Command::BuildRawS2(args) => raw(Modality::S2, args)?,
        Command::ExtendS1(args) => extend(Modality::S1, args)?,
        Command::ExtendS2(args) => extend(Modality::S2, args)?,
        Command::RemoveDiscouraged(args) => remove(args)?,
    };
    info!("Output written to: {:?}", written);
    Ok(())
}
