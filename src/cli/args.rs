use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use chrono::NaiveDate;
use swotmask::MaskParams;
use swotmask::types::{GapDetection, GapFill, InterpolationMethod, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "swotmask", version, about = "SWOT swath coverage masks")]
pub struct CliArgs {
    /// JSON parameter file; command-line options override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable logging (DEBUG unless RUST_LOG says otherwise)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the mask of a single date
    Mask {
        /// Date to process (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Output file; defaults to swotmask_<YYYYMMDD>.<ext> in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: MaskOptions,
    },
    /// Build one mask per date for an inclusive date range
    Batch {
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        #[arg(long)]
        output_dir: PathBuf,

        /// Abort the batch at the first failing date
        #[arg(long, default_value_t = false)]
        stop_on_error: bool,

        #[command(flatten)]
        options: MaskOptions,
    },
    /// Merge per-date netCDF masks of a directory into one time series
    Merge {
        #[arg(long)]
        input_dir: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Overrides for `MaskParams`; unset options keep the configured value
#[derive(Args, Debug, Default)]
pub struct MaskOptions {
    /// Root directory with one <YYYY> subdirectory of granules per year
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Nadir gap half-width in source swath columns
    #[arg(long)]
    pub padding: Option<usize>,

    #[arg(long, value_enum)]
    pub gap_detection: Option<GapDetection>,

    #[arg(long, value_enum)]
    pub gap_fill: Option<GapFill>,

    #[arg(long, value_enum)]
    pub interpolation: Option<InterpolationMethod>,

    /// Nearest-neighbour search radius in degrees
    #[arg(long)]
    pub nearest_max_distance: Option<f64>,

    /// Output format (netcdf or tiff)
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Fail the date when a granule cannot be read instead of skipping it
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Do not write the JSON provenance sidecar
    #[arg(long, default_value_t = false)]
    pub no_sidecar: bool,
}

impl MaskOptions {
    pub fn apply(&self, params: &mut MaskParams) {
        if let Some(dir) = &self.data_dir {
            params.data_dir = dir.clone();
        }
        if let Some(padding) = self.padding {
            params.padding = padding;
        }
        if let Some(mode) = self.gap_detection {
            params.gap_detection = mode;
        }
        if let Some(fill) = self.gap_fill {
            params.gap_fill = fill;
        }
        if let Some(method) = self.interpolation {
            params.interpolation = method;
        }
        if let Some(distance) = self.nearest_max_distance {
            params.nearest_max_distance = distance;
        }
        if let Some(format) = self.format {
            params.format = format;
        }
        if self.strict {
            params.skip_unreadable_granules = false;
        }
        if self.no_sidecar {
            params.sidecar = false;
        }
    }
}
