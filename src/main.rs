use anyhow::{anyhow, Context, Result};
use eframe::CreationContext;
use image_processor_client::api::ProcessorClient;
use image_processor_client::app::ImageProcessorApp;
use image_processor_client::config::AppConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("image_processor_client=info,image_processor=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(base_url = %config.base_url, "loaded configuration");

    let client = ProcessorClient::new(&config.base_url, config.request_timeout())
        .context("Failed to create HTTP client")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("image-processor-io")
        .build()
        .context("Failed to start async runtime")?;

    let app = ImageProcessorApp::new(config, client, runtime);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([640.0, 720.0])
            .with_min_inner_size([420.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Image Processor",
        options,
        Box::new(move |cc: &CreationContext| Box::new(app.attach(cc))),
    )
    .map_err(|e| anyhow!("Failed to open window: {}", e))
}
