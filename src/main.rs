use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use log::info;

use stac_mosaic::{
    components::{transport::reqwest_backend::ReqwestTransport, Timeouts},
    AssetFailurePolicy, BoundingBox, Pipeline, PipelineConfig, StacMosaicError, TemporalFilter,
    TimeRange,
};

const USAGE_EXIT_CODE: u8 = 64;

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("{e}"))
}

#[derive(Parser, Debug)]
#[command(name = "stac-mosaic", version)]
#[command(about = "Mosaic one band of a STAC asset over a bounding box")]
struct Args {
    /// Bounding box in the catalog's CRS
    #[arg(long, num_args = 4, value_names = ["XMIN", "YMIN", "XMAX", "YMAX"], allow_negative_numbers = true, required = true)]
    bbox: Vec<f64>,

    /// ISO-8601 start and end of the time range
    #[arg(long, num_args = 2, value_names = ["START", "END"], required = true)]
    time: Vec<String>,

    /// Asset id to extract from every matched item
    #[arg(long)]
    asset: String,

    /// Zero based band index
    #[arg(long, default_value = "0")]
    band: usize,

    /// STAC collection URL
    #[arg(long, env = "STAC_COLLECTION_URL")]
    collection: String,

    /// Output GeoTIFF path
    #[arg(short, long)]
    output: PathBuf,

    /// Search connect timeout in seconds
    #[arg(long, env = "STAC_SEARCH_CONNECT_TIMEOUT", default_value = "3", value_parser = parse_seconds)]
    connect_timeout: Duration,

    /// Search read timeout in seconds
    #[arg(long, env = "STAC_SEARCH_READ_TIMEOUT", default_value = "5", value_parser = parse_seconds)]
    read_timeout: Duration,

    /// Per asset HTTP timeout in seconds (default: none)
    #[arg(long, value_parser = parse_seconds)]
    download_timeout: Option<Duration>,

    /// Leave out assets that can not be read instead of failing
    #[arg(long)]
    skip_failed_assets: bool,

    /// Send the time range with the search
    #[arg(long)]
    temporal_filter: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> PipelineConfig {
        let bbox = BoundingBox::new(self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3]);
        let time_range = TimeRange::new(self.time[0].clone(), self.time[1].clone());
        PipelineConfig::new(
            bbox,
            time_range,
            self.asset,
            self.band,
            self.collection,
            self.output,
        )
        .with_search_timeouts(Timeouts {
            connect: self.connect_timeout,
            read: self.read_timeout,
        })
        .with_download_timeout(self.download_timeout)
        .with_asset_failure_policy(if self.skip_failed_assets {
            AssetFailurePolicy::Skip
        } else {
            AssetFailurePolicy::Abort
        })
        .with_temporal_filter(if self.temporal_filter {
            TemporalFilter::Enabled
        } else {
            TemporalFilter::Disabled
        })
    }
}

fn run(config: PipelineConfig) -> Result<(), StacMosaicError> {
    let transport = ReqwestTransport::new().map_err(StacMosaicError::SearchTransportError)?;
    let summary = Pipeline::new(config, transport).run()?;
    info!(
        "mosaic of {} rasters ({}x{}) written to {:?}",
        summary.rasters, summary.width, summary.height, summary.output
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(USAGE_EXIT_CODE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match run(args.into_config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
