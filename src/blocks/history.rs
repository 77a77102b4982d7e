//! Bounded recorder of closed-loop samples
//!
//! Keeps the most recent samples of time, position, setpoint and control
//! output in four parallel sequences, with CSV export.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;

use crate::error::ConfigError;

/// Default number of retained samples
pub const DEFAULT_HISTORY_LEN: usize = 500;

/// CSV column labels
pub const CSV_HEADER: [&str; 4] = ["time [s]", "position [rad]", "setpoint [rad]", "control"];

/// One recorded tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub position: f64,
    pub setpoint: f64,
    pub control: f64,
}

/// Owned copy of the history, safe to hand to another thread
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub time: Vec<f64>,
    pub position: Vec<f64>,
    pub setpoint: Vec<f64>,
    pub control: Vec<f64>,
}

/// Sliding window over the most recent samples
///
/// Pushing past `max_len` drops the oldest samples, so all four sequences
/// always hold the same number of entries in time order.
///
/// # Example
///
/// ```ignore
/// let mut history = HistoryBuffer::new(500)?;
/// history.push(Sample { time: 0.01, position: 0.1, setpoint: 0.0, control: -0.2 });
/// history.save("run.csv")?;
/// ```
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    time: VecDeque<f64>,
    position: VecDeque<f64>,
    setpoint: VecDeque<f64>,
    control: VecDeque<f64>,
    max_len: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer retaining at most `max_len` samples
    pub fn new(max_len: usize) -> Result<Self, ConfigError> {
        if max_len == 0 {
            return Err(ConfigError::InvalidHistoryLength);
        }

        Ok(Self {
            time: VecDeque::with_capacity(max_len + 1),
            position: VecDeque::with_capacity(max_len + 1),
            setpoint: VecDeque::with_capacity(max_len + 1),
            control: VecDeque::with_capacity(max_len + 1),
            max_len,
        })
    }

    /// Append a sample, evicting the oldest entries beyond the bound
    pub fn push(&mut self, sample: Sample) {
        self.time.push_back(sample.time);
        self.position.push_back(sample.position);
        self.setpoint.push_back(sample.setpoint);
        self.control.push_back(sample.control);

        while self.time.len() > self.max_len {
            self.time.pop_front();
            self.position.pop_front();
            self.setpoint.pop_front();
            self.control.pop_front();
        }
    }

    /// Get number of recorded samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.time.len() == self.max_len
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Clear all recorded data
    pub fn clear(&mut self) {
        self.time.clear();
        self.position.clear();
        self.setpoint.clear();
        self.control.clear();
    }

    pub fn time(&self) -> &VecDeque<f64> {
        &self.time
    }

    pub fn position(&self) -> &VecDeque<f64> {
        &self.position
    }

    pub fn setpoint(&self) -> &VecDeque<f64> {
        &self.setpoint
    }

    pub fn control(&self) -> &VecDeque<f64> {
        &self.control
    }

    /// Sample at `index`, oldest first
    pub fn get(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            time: *self.time.get(index)?,
            position: *self.position.get(index)?,
            setpoint: *self.setpoint.get(index)?,
            control: *self.control.get(index)?,
        })
    }

    /// Most recent sample
    pub fn last(&self) -> Option<Sample> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterate samples in chronological order
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Copy the four sequences out
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            time: self.time.iter().copied().collect(),
            position: self.position.iter().copied().collect(),
            setpoint: self.setpoint.iter().copied().collect(),
            control: self.control.iter().copied().collect(),
        }
    }

    /// Save recorded data to a CSV file
    ///
    /// # CSV Format
    ///
    /// ```csv
    /// time [s],position [rad],setpoint [rad],control
    /// 0.01,0.1,0.0,-0.2
    /// ```
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.save_to_writer(file)
    }

    /// Save recorded data as CSV to any writer
    pub fn save_to_writer<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record(CSV_HEADER)?;

        for sample in self.iter() {
            wtr.write_record(&[
                sample.time.to_string(),
                sample.position.to_string(),
                sample.setpoint.to_string(),
                sample.control.to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self {
            time: VecDeque::with_capacity(DEFAULT_HISTORY_LEN + 1),
            position: VecDeque::with_capacity(DEFAULT_HISTORY_LEN + 1),
            setpoint: VecDeque::with_capacity(DEFAULT_HISTORY_LEN + 1),
            control: VecDeque::with_capacity(DEFAULT_HISTORY_LEN + 1),
            max_len: DEFAULT_HISTORY_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> Sample {
        let t = i as f64 * 0.01;
        Sample {
            time: t,
            position: i as f64,
            setpoint: i as f64 * 10.0,
            control: -(i as f64),
        }
    }

    #[test]
    fn test_history_records_in_order() {
        let mut history = HistoryBuffer::new(100).unwrap();
        for i in 0..50 {
            history.push(sample(i));
        }

        assert_eq!(history.len(), 50);
        assert!(!history.is_empty());
        assert!(!history.is_full());

        assert_eq!(history.get(0), Some(sample(0)));
        assert_eq!(history.last(), Some(sample(49)));
        assert_eq!(history.get(50), None);
    }

    #[test]
    fn test_history_overflow_keeps_latest() {
        let mut history = HistoryBuffer::new(10).unwrap();
        for i in 0..25 {
            history.push(sample(i));
        }

        assert_eq!(history.len(), 10);
        assert!(history.is_full());
        assert_eq!(history.time().len(), 10);
        assert_eq!(history.position().len(), 10);
        assert_eq!(history.setpoint().len(), 10);
        assert_eq!(history.control().len(), 10);

        // Oldest sample should be #15, newest should be #24
        assert_eq!(history.position()[0], 15.0);
        assert_eq!(history.position()[9], 24.0);
        assert_eq!(history.setpoint()[9], 240.0);
        assert_eq!(history.control()[0], -15.0);
    }

    #[test]
    fn test_history_clear() {
        let mut history = HistoryBuffer::new(10).unwrap();
        history.push(sample(1));
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.last(), None);
        assert_eq!(history.snapshot(), HistorySnapshot::default());
    }

    #[test]
    fn test_history_zero_length_rejected() {
        assert!(matches!(
            HistoryBuffer::new(0),
            Err(ConfigError::InvalidHistoryLength)
        ));
        assert_eq!(HistoryBuffer::default().max_len(), DEFAULT_HISTORY_LEN);
    }

    #[test]
    fn test_history_snapshot_is_detached() {
        let mut history = HistoryBuffer::new(5).unwrap();
        for i in 0..3 {
            history.push(sample(i));
        }

        let snap = history.snapshot();
        history.push(sample(3));

        assert_eq!(snap.time.len(), 3);
        assert_eq!(snap.position, vec![0.0, 1.0, 2.0]);
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_history_csv() {
        let mut history = HistoryBuffer::new(2).unwrap();
        for i in 0..3 {
            history.push(sample(i));
        }

        let mut buffer = Vec::new();
        history.save_to_writer(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "time [s],position [rad],setpoint [rad],control");
        assert_eq!(lines[1], "0.01,1,10,-1");
        assert_eq!(lines[2], "0.02,2,20,-2");
    }
}
