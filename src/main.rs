//! Face liveness challenge runner against a simulated subject.

use anyhow::{bail, Result};
use clap::Parser;
use face_liveness::{
    app::LivenessApp,
    config::{LivenessConfig, EXAMPLE_CONFIG},
    inference::SharedEngine,
    simulation::{SimulatedCamera, SubjectBehaviour, SyntheticLandmarker},
    state::{OverallStatus, StepStatus},
};
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Subject behaviour (compliant, photo-swap, static, absent)
    #[arg(short, long, default_value = "compliant")]
    scenario: String,

    /// Seed for the challenge sequence and subject jitter (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated camera frame rate
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Add a smaller bystander face to every frame
    #[arg(long)]
    bystander: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Face Liveness Challenge");

    // Load configuration if provided
    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match LivenessConfig::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                LivenessConfig::default()
            }
        }
    } else {
        LivenessConfig::default()
    };
    config.validate()?;

    let behaviour: SubjectBehaviour = args.scenario.parse()?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Simulating a {behaviour} subject at {} fps (seed {seed})", args.fps);

    let mut rng = StdRng::seed_from_u64(seed);
    let engine = SharedEngine::new();
    let mut app = LivenessApp::new(config);
    let state = app.run(
        || {
            let camera = SimulatedCamera::new(behaviour, args.fps, seed);
            Ok(if args.bystander { camera.with_bystander() } else { camera })
        },
        &engine,
        || Ok(SyntheticLandmarker::new()),
        &mut rng,
    )?;

    for (index, step) in state.steps.iter().enumerate() {
        let mark = match step.status {
            StepStatus::Success => "passed",
            StepStatus::Failed => "FAILED",
            StepStatus::Active => "active",
            StepStatus::Pending => "-",
        };
        println!("{:>2}. {:<12} {mark}", index + 1, step.step.to_string());
    }
    println!("{:?} after {} frames: {}", state.overall_status, state.frame_count, state.message);

    if state.overall_status != OverallStatus::Success {
        if let Some(step) = state.current_step() {
            warn!("Stopped at step {} ({})", state.current_step_index + 1, step.step);
        }
        bail!(
            "Liveness not verified: {}",
            state.failure_reason.as_deref().unwrap_or(&state.message)
        );
    }

    Ok(())
}
