//! Headless runner for the rod simulation

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use rodsim::{PidGains, SimConfig, SimError, TickInputs};

#[derive(Parser, Debug)]
#[command(name = "rodsim")]
#[command(about = "Closed-loop PID simulation of a motor-driven rod")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults apply to missing fields)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Proportional gain
    #[arg(long)]
    kp: Option<f64>,

    /// Integral gain
    #[arg(long)]
    ki: Option<f64>,

    /// Derivative gain
    #[arg(long)]
    kd: Option<f64>,

    /// Target rod angle (rad)
    #[arg(short, long, allow_negative_numbers = true)]
    setpoint: Option<f64>,

    /// Gravity bias
    #[arg(short, long, allow_negative_numbers = true)]
    disturbance: Option<f64>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 1000)]
    ticks: usize,

    /// Seed for the process noise
    #[arg(long)]
    seed: Option<u64>,

    /// Disable process noise
    #[arg(long)]
    no_noise: bool,

    /// Starting rod angle (rad)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    initial_position: f64,

    /// Write the retained history to a CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimConfig::default(),
        };

        if self.seed.is_some() {
            config.noise.seed = self.seed;
        }
        if self.no_noise {
            config.noise.enabled = false;
        }

        // Command-line tuning overrides the starting inputs
        let base = config.initial_inputs;
        config.initial_inputs = TickInputs {
            setpoint: self.setpoint.unwrap_or(base.setpoint),
            gains: PidGains::new(
                self.kp.unwrap_or(base.gains.kp),
                self.ki.unwrap_or(base.gains.ki),
                self.kd.unwrap_or(base.gains.kd),
            ),
            disturbance: self.disturbance.unwrap_or(base.disturbance),
        };
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let inputs = config.initial_inputs;

    let mut stepper = config.build().context("invalid configuration")?;
    stepper.set_initial_state(cli.initial_position, 0.0);
    stepper.start();

    info!(
        "running {} ticks: Kp={} Ki={} Kd={} setpoint={} disturbance={}",
        cli.ticks,
        inputs.gains.kp,
        inputs.gains.ki,
        inputs.gains.kd,
        inputs.setpoint,
        inputs.disturbance
    );

    let diverged = match stepper.run(&inputs, cli.ticks) {
        Ok(_) => None,
        Err(e @ SimError::Diverged { .. }) => Some(e),
        Err(e) => return Err(e.into()),
    };

    let plant = stepper.plant().info();
    let terms = stepper.controller().terms();

    println!("Time: {:.2}s", stepper.time());
    println!();
    println!("Position: {:.3} rad", plant.position);
    println!("Velocity: {:.3} rad/s", plant.velocity);
    println!("Setpoint: {:.3} rad", inputs.setpoint);
    println!();
    println!("PID Terms:");
    println!("P: {:.3}", terms.proportional);
    println!("I: {:.3}", terms.integral);
    println!("D: {:.3}", terms.derivative);
    println!("Output: {:.3}", terms.total_output);
    println!();
    println!("Plant Parameters:");
    println!("K: {:.2}", plant.gain);
    println!("wn: {:.2}", plant.natural_frequency);
    println!("zeta: {:.2}", plant.damping_ratio);

    if let Some(path) = &cli.csv {
        stepper
            .history()
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {} samples to {}", stepper.history().len(), path.display());
    }

    if let Some(e) = diverged {
        return Err(e).context("reset with a smaller gain or step");
    }

    Ok(())
}
