use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vmon_core::{MonitorSettings, RenderSurface};
use vmon_runtime::{LogSurface, MonitorService, SvgSurface};
use vmon_stream::{FieldModel, SimulatedSource};

#[derive(Parser)]
#[command(name = "vmon", version, about = "Headless vector-field monitor")]
struct Cli {
    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream from the simulated magnetometer for a while
    Run {
        #[arg(long, default_value_t = 10)]
        duration_seconds: u64,
        /// Settings file (JSON); defaults are used when absent
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Window length in seconds, overrides the settings file
        #[arg(long)]
        window: Option<f64>,
        /// Sample rate in Hz, overrides the settings file
        #[arg(long)]
        rate: Option<f64>,
        /// Write field.svg and noise.svg here
        #[arg(long)]
        svg_dir: Option<PathBuf>,
        /// Simulate the device dropping out after this many samples
        #[arg(long)]
        disconnect_after: Option<u64>,
        /// Half-width of the uniform simulated noise, in nT
        #[arg(long)]
        noise: Option<f64>,
    },
    /// Write a settings file with default values
    InitSettings { path: PathBuf },
    /// Print the normalized settings a run would use
    ShowSettings {
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Run {
            duration_seconds,
            settings,
            window,
            rate,
            svg_dir,
            disconnect_after,
            noise,
        } => {
            let settings = resolve_settings(settings.as_deref(), window, rate)?;
            let mut model = FieldModel::default();
            if let Some(noise) = noise {
                model.noise = noise.max(0.0);
            }
            let mut source = SimulatedSource::new(model);
            if let Some(samples) = disconnect_after {
                source = source.with_disconnect_after(samples);
            }
            let (plot, noise_plot) = build_surfaces(&settings, svg_dir.as_deref());

            let mut service = MonitorService::new(&settings, Box::new(source), plot, noise_plot)?;
            service.run_for_duration(Duration::from_secs(duration_seconds))?;
            service.shutdown()?;

            if let Some(state) = service.poll_state() {
                log::info!(
                    "{} samples ingested, {} frames ({} skipped), {} analyses ({} skipped)",
                    state.total_samples,
                    state.render_ticks,
                    state.skipped_frames,
                    state.analysis_runs,
                    state.skipped_analyses
                );
                if let Some(err) = &state.last_error {
                    log::warn!("last error: {err}");
                }
            }
        }
        Commands::InitSettings { path } => {
            MonitorSettings::default().save_to_file(&path)?;
            println!("Wrote {}", path.display());
        }
        Commands::ShowSettings { settings } => {
            let settings = resolve_settings(settings.as_deref(), None, None)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

/// File values first, then command-line overrides, then normalization.
fn resolve_settings(
    path: Option<&Path>,
    window: Option<f64>,
    rate: Option<f64>,
) -> Result<MonitorSettings, Box<dyn std::error::Error>> {
    let mut settings = match path {
        Some(path) => MonitorSettings::load_from_file(path)?,
        None => MonitorSettings::default(),
    };
    if let Some(window) = window {
        settings.window_duration_s = window;
    }
    if let Some(rate) = rate {
        settings.sample_rate_hz = rate;
    }
    Ok(settings.normalized()?)
}

fn build_surfaces(
    settings: &MonitorSettings,
    svg_dir: Option<&Path>,
) -> (Box<dyn RenderSurface>, Box<dyn RenderSurface>) {
    match svg_dir {
        Some(dir) => {
            // one file per second is plenty for a headless run
            let every = (1000 / settings.render_interval_ms).max(1);
            (
                Box::new(SvgSurface::new(dir.join("field.svg"), every)),
                Box::new(SvgSurface::new(dir.join("noise.svg"), 1)),
            )
        }
        None => (
            Box::new(LogSurface::new("field", 10)),
            Box::new(LogSurface::new("noise", 1)),
        ),
    }
}
