use prodgen::{
    DiskFile, FileHandle, GenerationMode, HttpBackend, ModelRegistry, Orchestrator,
    ResultArtifact, StudioConfig,
};
use std::env;
use std::fs;
use std::sync::Arc;

const USAGE: &str = "usage: prodgen <image|video> <prompt> [image paths...]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    prodgen::logger::init_with_config(prodgen::logger::LoggerConfig::from_env(
        prodgen::logger::LoggerConfig::development(),
    ))?;
    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let mut args = env::args().skip(1);
    let mode: GenerationMode = match args.next() {
        Some(mode) => mode.parse()?,
        None => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    let prompt = args.next().unwrap_or_default();
    let paths: Vec<String> = args.collect();

    let config = StudioConfig::from_env()
        .with_initial_mode(mode)
        .with_initial_prompt(prompt);
    prodgen::logger::log_config_info(&config);

    let backend_config = config.backend.clone().unwrap_or_default();
    let backend = HttpBackend::new(&backend_config)?;
    let studio = Orchestrator::new(
        Arc::new(ModelRegistry::builtin().clone()),
        Arc::new(backend),
        &config,
    );

    log::info!("📚 Available {} models:", mode);
    for model in studio.registry().for_mode(mode) {
        log::info!("  {} - {}", model.id, model.label);
    }

    let mut files: Vec<Box<dyn FileHandle>> = Vec::with_capacity(paths.len());
    for path in &paths {
        files.push(Box::new(DiskFile::open(path).await?));
    }
    if !files.is_empty() {
        let report = studio.add_images(files).await;
        for rejection in &report.rejections {
            log::warn!("⚠️  {}", rejection);
        }
    }

    let model = studio.selected_model();
    log::info!("🎨 Generating with {} ({})", model.label, model.id);

    match studio.submit().await {
        Ok(ResultArtifact::Image(image)) => {
            let filename = format!(
                "generated_{}_{}.{}",
                model.id.replace(['.', ':'], "_"),
                chrono::Utc::now().timestamp(),
                image.extension()
            );
            fs::write(&filename, image.decode()?)?;
            log::info!("💾 Image saved to: {}", filename);
        }
        Ok(ResultArtifact::Video(video)) => {
            log::info!("🎬 Video ready: {}", video.uri);
        }
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
