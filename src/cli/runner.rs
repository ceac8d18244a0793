use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use swotmask::MaskParams;
use swotmask::api::{
    merge_directory_to_path, output_file_name, process_date_range_to_dir, process_date_to_path,
};

use super::args::{CliArgs, Command, MaskOptions};
use super::errors::AppError;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_params(config: Option<&Path>, options: Option<&MaskOptions>) -> Result<MaskParams, AppError> {
    let mut params = match config {
        Some(path) => {
            info!("Loading parameters from {:?}", path);
            MaskParams::from_json_file(path)?
        }
        None => MaskParams::default(),
    };
    if let Some(options) = options {
        options.apply(&mut params);
    }
    Ok(params)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        init_logging();
    }

    match args.command {
        Command::Mask {
            date,
            output,
            options,
        } => {
            let params = load_params(args.config.as_deref(), Some(&options))?;
            let output =
                output.unwrap_or_else(|| PathBuf::from(output_file_name(date, params.format)));
            info!("Processing: {} -> {:?}", date, output);

            let result = process_date_to_path(date, &output, &params).map_err(AppError::from)?;
            for skipped in &result.skipped {
                warn!("Skipped granule {:?}: {}", skipped.path, skipped.reason);
            }
            info!(
                "Successfully processed: {} ({} granule(s), {} covered cells)",
                date,
                result.granules.len(),
                result.covered_cells()
            );
        }
        Command::Batch {
            start,
            end,
            output_dir,
            stop_on_error,
            options,
        } => {
            let params = load_params(args.config.as_deref(), Some(&options))?;
            info!("Starting batch processing from {} to {}", start, end);
            info!("Granule directory: {:?}", params.data_dir);
            info!("Output directory: {:?}", output_dir);

            let report = process_date_range_to_dir(start, end, &output_dir, &params, !stop_on_error)
                .map_err(AppError::from)?;

            info!("Batch processing complete!");
            info!("Processed: {}", report.processed);
            info!("Empty: {}", report.empty);
            info!("Errors: {}", report.errors);
            for skipped in &report.skipped_granules {
                warn!("Skipped granule {:?}: {}", skipped.path, skipped.reason);
            }
            if report.errors > 0 {
                let dates: Vec<String> = report
                    .failed_dates
                    .iter()
                    .map(|(date, reason)| {
                        warn!("Failed date {}: {}", date, reason);
                        date.to_string()
                    })
                    .collect();
                return Err(AppError::BatchFailed {
                    errors: report.errors,
                    total: report.processed + report.errors,
                    dates: dates.join(", "),
                }
                .into());
            }
        }
        Command::Merge { input_dir, output } => {
            let params = load_params(args.config.as_deref(), None)?;
            let count = merge_directory_to_path(&input_dir, &output, &params.attributes)
                .map_err(AppError::from)?;
            info!("Output saved to: {:?} ({} date(s))", output, count);
        }
    }

    Ok(())
}
