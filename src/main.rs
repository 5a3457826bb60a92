//! WSI Clip - command-line client for a WSI clip server.
//!
//! This binary wires the HTTP client into the load orchestrator and runs
//! one user flow per subcommand.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_clip::{
    api::{HttpSlideApi, SaveResponse, SlideApi},
    config::{Cli, ClientConfig, ClipArgs, Command, InfoArgs},
    session::LoadOrchestrator,
    view::Renderer,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.client.verbose);

    if let Err(e) = cli.client.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let api = match HttpSlideApi::new(&cli.client.server_url, cli.client.timeout()) {
        Ok(api) => api,
        Err(e) => {
            error!("Cannot create client for {}: {}", cli.client.server_url, e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Using API at {}", api.base_url());

    let viewer = LoadOrchestrator::new(api, cli.client.viewer_options());

    match cli.command {
        Command::Files => run_files(&viewer).await,
        Command::Info(args) => run_info(&viewer, args).await,
        Command::Clip(args) => run_clip(&viewer, &cli.client, args).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_clip=debug"
    } else {
        "wsi_clip=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Files Command
// =============================================================================

async fn run_files(viewer: &LoadOrchestrator<HttpSlideApi>) -> ExitCode {
    match viewer.list_files().await {
        Ok(files) => {
            if files.is_empty() {
                println!("(no slides found)");
            } else {
                for file in &files {
                    println!("{}", file);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Info Command
// =============================================================================

async fn run_info(viewer: &LoadOrchestrator<HttpSlideApi>, args: InfoArgs) -> ExitCode {
    let metadata = match viewer.slide_info(&args.file).await {
        Ok(metadata) => metadata,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("File:       {}", metadata.filename);
    println!("Dimensions: {} x {}", metadata.width(), metadata.height());
    println!("Levels:     {}", metadata.level_count);
    for level in &metadata.levels {
        println!(
            "  [{}] {} x {} (downsample {:.2})",
            level.level, level.dimensions.0, level.dimensions.1, level.downsample
        );
    }

    if args.properties {
        println!();
        println!("Properties:");
        if metadata.properties.is_empty() {
            println!("  (none)");
        }
        for (key, value) in &metadata.properties {
            println!("  {} = {}", key, value);
        }
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Clip Command
// =============================================================================

async fn run_clip(
    viewer: &LoadOrchestrator<HttpSlideApi>,
    client: &ClientConfig,
    args: ClipArgs,
) -> ExitCode {
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    if args.client_download {
        match viewer.api().server_config().await {
            Ok(config) if !config.client_save_enabled => {
                warn!("Server has client downloads disabled; it will store the clip instead");
            }
            Ok(config) => debug!("Server allows up to {} pixels per clip", config.max_pixels),
            Err(e) => debug!("Server config unavailable: {}", e.user_message()),
        }
    }

    if let Err(e) = viewer.select_file(&args.file).await {
        error!("{}", e);
        return ExitCode::FAILURE;
    }
    if let Some(geometry) = viewer.geometry() {
        info!(
            "Canvas {}x{} within {}x{} container",
            geometry.display_width, geometry.display_height, client.canvas_width,
            client.canvas_height
        );
    }

    if let Some(drag) = args.select {
        viewer.pointer_down(drag.from.0, drag.from.1);
        viewer.pointer_move(drag.to.0, drag.to.1, args.square);
        let selection = viewer.pointer_up();
        if !selection.has_selection {
            error!(
                "Selection from ({}, {}) to ({}, {}) is outside the canvas or too small",
                drag.from.0, drag.from.1, drag.to.0, drag.to.1
            );
            return ExitCode::FAILURE;
        }

        match viewer.apply_selection().await {
            Ok(view) => println!(
                "Region: x={} y={} width={} height={}",
                view.x, view.y, view.width, view.height
            ),
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(ref path) = args.render {
        if let Err(e) = write_render(viewer, path).await {
            error!("Failed to write {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        println!("Rendered canvas to {}", path.display());
    }

    if let Some(ref name) = args.save {
        match viewer.save(name, args.client_download).await {
            Ok(SaveResponse::Stored { path, message }) => {
                println!("{}", message.unwrap_or_else(|| format!("Saved to {}", path)));
            }
            Ok(SaveResponse::Download { filename, data }) => {
                let target = args.output.clone().unwrap_or_else(|| {
                    Path::new(&filename)
                        .file_name()
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from("clip.png"))
                });
                if let Err(e) = tokio::fs::write(&target, &data).await {
                    error!("Failed to write {}: {}", target.display(), e);
                    return ExitCode::FAILURE;
                }
                println!("Downloaded {} bytes to {}", data.len(), target.display());
            }
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Render the current canvas with its overlay to a PNG file.
async fn write_render(
    viewer: &LoadOrchestrator<HttpSlideApi>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = viewer
        .render(&Renderer::new())
        .ok_or("nothing is displayed")?;
    let png = frame.encode_png()?;
    tokio::fs::write(path, png).await?;
    Ok(())
}
