//! PID controller

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_timestep, ConfigError};

/// Default bound on the integral term `Ki * integral(e)`
pub const DEFAULT_INTEGRAL_LIMIT: f64 = 10.0;

/// Proportional, integral and derivative gains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Proportional-only gains
    pub const fn proportional(kp: f64) -> Self {
        Self::new(kp, 0.0, 0.0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("kp", self.kp)?;
        ensure_finite("ki", self.ki)?;
        ensure_finite("kd", self.kd)?;
        Ok(())
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self::proportional(1.0)
    }
}

/// Decomposition of the most recent control output
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PidTerms {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
    pub total_output: f64,
}

/// Integral windup protection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AntiWindup {
    /// Unbounded integration
    Disabled,
    /// Limit the integral term to `[-limit, limit]`
    ///
    /// The accumulated error is held at `limit / |Ki|` so the term recovers
    /// as soon as the error changes sign. With `Ki = 0` it is not integrated
    /// at all, so raising `Ki` later starts from the stored value.
    Clamp { limit: f64 },
    /// Saturate the output to `[min, max]` and stop integrating while the
    /// unsaturated output lies outside that range
    Conditional { min: f64, max: f64 },
}

impl Default for AntiWindup {
    fn default() -> Self {
        AntiWindup::Clamp {
            limit: DEFAULT_INTEGRAL_LIMIT,
        }
    }
}

impl AntiWindup {
    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            AntiWindup::Disabled => Ok(()),
            AntiWindup::Clamp { limit } => {
                ensure_finite("integral_limit", limit)?;
                if limit < 0.0 {
                    return Err(ConfigError::InvalidLimits {
                        min: -limit,
                        max: limit,
                    });
                }
                Ok(())
            }
            AntiWindup::Conditional { min, max } => {
                ensure_finite("output_min", min)?;
                ensure_finite("output_max", max)?;
                if min >= max {
                    return Err(ConfigError::InvalidLimits { min, max });
                }
                Ok(())
            }
        }
    }
}

/// Signal the derivative term differentiates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeMode {
    /// `-d(measured)/dt`: no spike when the setpoint steps
    #[default]
    OnMeasurement,
    /// `d(error)/dt`
    OnError,
}

/// PID controller
///
/// Implements `u = Kp*e + Ki*integral(e) + Kd*de/dt` with `e = setpoint - measured`.
///
/// The integral is accumulated with the rectangular rule, including the
/// current error. The derivative is a backward difference and is zero on the
/// first call after construction or [`reset`](Pid::reset).
///
/// # Example
///
/// ```ignore
/// let mut pid = Pid::new(PidGains::new(2.0, 0.5, 0.1), 0.01)?;
/// let u = pid.compute(0.0, measured);
/// ```
#[derive(Debug, Clone)]
pub struct Pid {
    // Parameters
    gains: PidGains,
    dt: f64,
    anti_windup: AntiWindup,
    derivative_mode: DerivativeMode,

    // State
    integral: f64,
    prev_measurement: Option<f64>,
    prev_error: Option<f64>,
    terms: PidTerms,
}

impl Pid {
    /// Create PID controller with gains and fixed step
    pub fn new(gains: PidGains, dt: f64) -> Result<Self, ConfigError> {
        gains.validate()?;
        let dt = ensure_timestep(dt)?;

        Ok(Self {
            gains,
            dt,
            anti_windup: AntiWindup::default(),
            derivative_mode: DerivativeMode::default(),
            integral: 0.0,
            prev_measurement: None,
            prev_error: None,
            terms: PidTerms::default(),
        })
    }

    pub fn with_anti_windup(mut self, anti_windup: AntiWindup) -> Result<Self, ConfigError> {
        self.set_anti_windup(anti_windup)?;
        Ok(self)
    }

    pub fn with_derivative_mode(mut self, mode: DerivativeMode) -> Self {
        self.derivative_mode = mode;
        self
    }

    /// Compute the control signal for one step
    pub fn compute(&mut self, setpoint: f64, measured: f64) -> f64 {
        let PidGains { kp, ki, kd } = self.gains;
        let error = setpoint - measured;

        let derivative = match self.derivative_mode {
            DerivativeMode::OnMeasurement => self
                .prev_measurement
                .map_or(0.0, |prev| -(measured - prev) / self.dt),
            DerivativeMode::OnError => self
                .prev_error
                .map_or(0.0, |prev| (error - prev) / self.dt),
        };
        self.prev_measurement = Some(measured);
        self.prev_error = Some(error);

        let proportional = kp * error;
        let derivative = kd * derivative;

        let integral_before = self.integral;
        self.integral += error * self.dt;

        let (integral, total_output) = match self.anti_windup {
            AntiWindup::Disabled => {
                let integral = ki * self.integral;
                (integral, proportional + integral + derivative)
            }
            AntiWindup::Clamp { limit } => {
                if ki == 0.0 {
                    // No integral action: hold the accumulator
                    self.integral = integral_before;
                } else {
                    let bound = limit / ki.abs();
                    self.integral = self.integral.clamp(-bound, bound);
                }
                let integral = (ki * self.integral).clamp(-limit, limit);
                (integral, proportional + integral + derivative)
            }
            AntiWindup::Conditional { min, max } => {
                let unsaturated = proportional + ki * self.integral + derivative;
                if unsaturated < min || unsaturated > max {
                    // Hold integration while saturated
                    self.integral = integral_before;
                }
                let integral = ki * self.integral;
                (integral, (proportional + integral + derivative).clamp(min, max))
            }
        };

        self.terms = PidTerms {
            proportional,
            integral,
            derivative,
            total_output,
        };

        total_output
    }

    /// Clear integral and derivative history; gains are kept
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_measurement = None;
        self.prev_error = None;
        self.terms = PidTerms::default();
        debug!("controller reset");
    }

    /// Set PID gains, effective from the next compute
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Terms of the most recent compute
    pub fn terms(&self) -> PidTerms {
        self.terms
    }

    /// Accumulated integral of the error
    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn anti_windup(&self) -> AntiWindup {
        self.anti_windup
    }

    pub fn set_anti_windup(&mut self, anti_windup: AntiWindup) -> Result<(), ConfigError> {
        anti_windup.validate()?;
        self.anti_windup = anti_windup;
        Ok(())
    }

    pub fn derivative_mode(&self) -> DerivativeMode {
        self.derivative_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f64 = 0.01;

    fn pid(kp: f64, ki: f64, kd: f64) -> Pid {
        Pid::new(PidGains::new(kp, ki, kd), DT).unwrap()
    }

    #[test]
    fn test_pid_proportional_only() {
        let mut pid = pid(2.0, 0.0, 0.0);

        assert_eq!(pid.compute(1.0, 0.0), 2.0);
        assert_eq!(pid.compute(0.5, -0.25), 2.0 * (0.5 - -0.25));
        assert_eq!(pid.compute(-1.0, 3.0), 2.0 * (-1.0 - 3.0));
    }

    #[test]
    fn test_pid_integral_unclamped() {
        let mut pid = pid(0.0, 1.5, 0.0)
            .with_anti_windup(AntiWindup::Disabled)
            .unwrap();

        let n = 100;
        let mut output = 0.0;
        for _ in 0..n {
            output = pid.compute(1.0, 0.2);
        }

        let expected = 1.5 * 0.8 * DT * n as f64;
        assert_relative_eq!(output, expected, epsilon = 1e-10);
        assert_relative_eq!(pid.terms().integral, expected, epsilon = 1e-10);
        assert_relative_eq!(pid.integral(), 0.8 * DT * n as f64, epsilon = 1e-10);
    }

    #[test]
    fn test_pid_integral_clamped() {
        let mut pid = pid(0.0, 2.0, 0.0)
            .with_anti_windup(AntiWindup::Clamp { limit: 0.5 })
            .unwrap();

        for _ in 0..1000 {
            pid.compute(1.0, 0.0);
        }

        assert_relative_eq!(pid.terms().integral, 0.5, epsilon = 1e-12);
        assert_relative_eq!(pid.integral(), 0.25, epsilon = 1e-12);

        // Recovers immediately once the error reverses
        let out = pid.compute(0.0, 1.0);
        assert!(out < 0.5);
    }

    #[test]
    fn test_pid_clamp_holds_accumulator_without_integral_gain() {
        let mut pid = pid(1.0, 0.0, 0.0);

        // Constant error for a long time with Ki = 0
        for _ in 0..100_000 {
            pid.compute(0.0, 0.0625);
        }
        assert_eq!(pid.integral(), 0.0);

        pid.set_gains(PidGains::new(1.0, 0.5, 0.0));
        pid.compute(0.0, 0.0625);

        assert_relative_eq!(pid.terms().integral, 0.5 * -0.0625 * DT, epsilon = 1e-12);
    }

    #[test]
    fn test_pid_clamp_bounds_negative_integral_gain() {
        let mut pid = pid(0.0, -1.0, 0.0);

        for _ in 0..100_000 {
            pid.compute(1.0, 0.0);
        }

        assert_relative_eq!(pid.integral(), DEFAULT_INTEGRAL_LIMIT, epsilon = 1e-12);
        assert_relative_eq!(pid.terms().integral, -DEFAULT_INTEGRAL_LIMIT, epsilon = 1e-12);

        // Unwinds within one bound's worth of ticks
        let ticks = (1..=2000).find(|_| pid.compute(-1.0, 0.0) > 0.0);
        assert!(matches!(ticks, Some(n) if n <= 1001), "ticks = {:?}", ticks);
    }

    #[test]
    fn test_pid_conditional_integration() {
        let mut pid = pid(1.0, 0.5, 0.0)
            .with_anti_windup(AntiWindup::Conditional {
                min: -10.0,
                max: 10.0,
            })
            .unwrap();

        // Large constant error, would normally wind up
        for _ in 0..200 {
            pid.compute(100.0, 0.0);
        }

        assert_eq!(pid.terms().total_output, 10.0);
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_pid_derivative_on_measurement() {
        let mut pid = pid(0.0, 0.0, 1.0);

        // First call has no history
        assert_eq!(pid.compute(0.0, 0.0), 0.0);

        // Measurement rises by 0.01 over one step: -1.0
        let out = pid.compute(0.0, 0.01);
        assert_relative_eq!(out, -1.0, epsilon = 1e-10);

        // Setpoint step does not kick
        let out = pid.compute(5.0, 0.01);
        assert_relative_eq!(out, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pid_derivative_on_error() {
        let mut pid = pid(0.0, 0.0, 1.0).with_derivative_mode(DerivativeMode::OnError);

        pid.compute(0.0, 0.0);
        let out = pid.compute(1.0, 0.0);

        // (1.0 - 0.0) / 0.01
        assert_relative_eq!(out, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pid_terms_sum_to_output() {
        let mut pid = pid(1.2, 0.7, 0.05);
        for i in 0..20 {
            pid.compute(0.3, 0.01 * i as f64);
        }

        let terms = pid.terms();
        assert_relative_eq!(
            terms.proportional + terms.integral + terms.derivative,
            terms.total_output,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_set_gains_keeps_integral() {
        let mut pid = pid(0.0, 1.0, 0.0);
        for _ in 0..10 {
            pid.compute(1.0, 0.0);
        }
        let integral = pid.integral();

        pid.set_gains(PidGains::new(0.0, 3.0, 0.0));
        assert_eq!(pid.integral(), integral);

        let out = pid.compute(1.0, 0.0);
        assert_relative_eq!(out, 3.0 * (integral + DT), epsilon = 1e-12);
    }

    #[test]
    fn test_reset_matches_fresh_controller() {
        let gains = PidGains::new(1.0, 2.0, 0.3);
        let mut fresh = Pid::new(gains, DT).unwrap();
        let expected = fresh.compute(0.5, 0.1);

        let mut used = Pid::new(gains, DT).unwrap();
        for i in 0..50 {
            used.compute(1.0, -0.02 * i as f64);
        }
        used.reset();

        assert_eq!(used.compute(0.5, 0.1), expected);
        assert_eq!(used.gains(), gains);
    }

    #[test]
    fn test_reset_clears_terms() {
        let mut pid = pid(1.0, 1.0, 1.0);
        pid.compute(1.0, 0.0);
        pid.reset();

        assert_eq!(pid.terms(), PidTerms::default());
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            Pid::new(PidGains::default(), 0.0),
            Err(ConfigError::InvalidTimestep(_))
        ));
        assert!(Pid::new(PidGains::default(), f64::NAN).is_err());
        assert!(Pid::new(PidGains::new(f64::INFINITY, 0.0, 0.0), DT).is_err());

        let pid = Pid::new(PidGains::default(), DT).unwrap();
        assert!(pid
            .clone()
            .with_anti_windup(AntiWindup::Conditional { min: 1.0, max: -1.0 })
            .is_err());
        assert!(pid
            .with_anti_windup(AntiWindup::Clamp { limit: -1.0 })
            .is_err());
    }
}
