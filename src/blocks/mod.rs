//! Components of the control loop

mod history;
mod noise;
mod pid;
mod plant;

pub use history::{HistoryBuffer, HistorySnapshot, Sample, CSV_HEADER, DEFAULT_HISTORY_LEN};
pub use noise::{GaussianNoise, NoiseSource, Silent, DEFAULT_NOISE_STD_DEV};
pub use pid::{AntiWindup, DerivativeMode, Pid, PidGains, PidTerms, DEFAULT_INTEGRAL_LIMIT};
pub use plant::{Plant, PlantInfo, PlantParameters, DEFAULT_DISTURBANCE};
