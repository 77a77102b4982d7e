//! Step response of the rod loop with live retuning
//!
//! Starts with proportional control only, which leaves a steady-state error
//! against the gravity bias, then adds integral and derivative action
//! mid-run without resetting the loop.

use rodsim::prelude::*;

fn print_header() {
    println!("{:>8} {:>10} {:>10} {:>10} {:>10}", "Time", "Setpoint", "Angle", "Control", "I-term");
    println!("{:-<8} {:-<10} {:-<10} {:-<10} {:-<10}", "", "", "", "", "");
}

fn run_phase(stepper: &mut Stepper<Silent>, inputs: &TickInputs, ticks: usize) -> Result<(), SimError> {
    for i in 0..ticks {
        let Some(sample) = stepper.step(inputs)? else {
            break;
        };
        if i % 50 == 0 {
            println!(
                "{:8.2} {:10.4} {:10.4} {:10.4} {:10.4}",
                sample.time,
                sample.setpoint,
                sample.position,
                sample.control,
                stepper.controller().terms().integral
            );
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let params = PlantParameters::default();
    let plant = Plant::with_noise(params, Silent)?;
    let pid = Pid::new(PidGains::proportional(2.0), params.dt)?;
    let mut stepper = Stepper::new(plant, pid, DEFAULT_HISTORY_LEN)?;

    println!("Rod step response");
    println!("=================");
    println!(
        "Plant: K={} wn={} zeta={} dt={}",
        params.gain, params.natural_frequency, params.damping_ratio, params.dt
    );
    println!();

    let mut inputs = TickInputs {
        setpoint: 0.2,
        gains: PidGains::proportional(2.0),
        disturbance: 0.5,
    };

    stepper.start();

    println!("Phase 1: P only (Kp=2.0)");
    print_header();
    run_phase(&mut stepper, &inputs, 1000)?;
    let p_only = stepper.plant().position();
    println!();
    println!("  Steady-state error: {:.4}", inputs.setpoint - p_only);
    println!();

    inputs.gains = PidGains::new(2.0, 3.0, 0.3);
    println!("Phase 2: PID (Kp=2.0, Ki=3.0, Kd=0.3), integrator kept");
    print_header();
    run_phase(&mut stepper, &inputs, 1500)?;
    println!();
    println!(
        "  Steady-state error: {:.4}",
        inputs.setpoint - stepper.plant().position()
    );
    println!("  Retained samples:   {}", stepper.history().len());

    Ok(())
}
