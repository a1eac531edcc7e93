mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use harvest_engine::{
    export_dataset, ApiSettings, HarvestCache, Harvester, YouTubeDataApi, YtTranscriptFetcher,
};
use harvest_logging::{harvest_error, harvest_info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let settings = config::build();
    logging::initialize(logging::LogDestination::Both, &settings.log_file);

    // The only fatal precondition of a run: without the credential no
    // provider call can succeed.
    let api_key = match std::env::var(config::API_KEY_ENV) {
        Ok(key) if !key.is_empty() => key,
        _ => {
            harvest_error!("Please set the {} environment variable", config::API_KEY_ENV);
            return ExitCode::FAILURE;
        }
    };

    let api = match YouTubeDataApi::new(ApiSettings::new(api_key)) {
        Ok(api) => Arc::new(api),
        Err(err) => {
            harvest_error!("Failed to build provider client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let cache = Arc::new(HarvestCache::new(settings.cache_dir.clone()));
    let harvester = Harvester::new(
        api.clone(),
        Arc::new(YtTranscriptFetcher::default()),
        api,
        cache,
        settings.clone(),
    );

    harvest_info!("Starting to harvest {} channels", settings.channels.len());
    let records = harvester.harvest_all().await;

    match export_dataset(
        &records,
        &settings.output_dir,
        settings.output_format,
        Utc::now(),
    ) {
        Ok(summary) => {
            harvest_info!(
                "Harvest completed! Processed {} videos and {} comments",
                summary.video_count,
                summary.comment_count
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            harvest_error!("Failed to export dataset: {err}");
            ExitCode::FAILURE
        }
    }
}
