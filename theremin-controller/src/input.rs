//! User input
//!
//! Runs both sensors on a dedicated thread and exposes the hand positions as
//! normalised volume and pitch values.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use theremin_core::Scheduler;
use theremin_drivers::UltrasonicSensor;

use crate::board::Board;
use crate::channels::DistanceSignal;
use crate::config::{ChannelConfig, ControllerConfig};
use crate::tasks::{self, Channel};

/// Hand distance range mapped onto `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
}

impl InputRange {
    /// Range covering `min..=max` metres
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Map a distance into the range, clamping outside values
    pub fn normalise(&self, distance: Option<f64>) -> Option<f64> {
        distance.map(|d| ((d - self.min) / (self.max - self.min)).clamp(0.0, 1.0))
    }
}

impl From<&ChannelConfig> for InputRange {
    fn from(config: &ChannelConfig) -> Self {
        Self::new(config.min_distance, config.max_distance)
    }
}

/// Volume and pitch controls backed by a sensor thread
///
/// Dropping it stops the thread and waits for it.
pub struct UserInput {
    volume: Arc<DistanceSignal>,
    pitch: Arc<DistanceSignal>,
    volume_range: InputRange,
    pitch_range: InputRange,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<Result<()>>>,
}

impl UserInput {
    /// Start reading both sensors of `board` in the background
    pub fn spawn<B: Board>(board: B, config: &ControllerConfig) -> Result<Self> {
        let volume = Arc::new(DistanceSignal::new());
        let pitch = Arc::new(DistanceSignal::new());
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let (volume, pitch, stop) = (volume.clone(), pitch.clone(), stop.clone());
            let config = config.clone();
            thread::Builder::new()
                .name("sensors".into())
                .spawn(move || run_sensors(board, &config, volume, pitch, stop))
                .context("spawning sensor thread")?
        };

        Ok(Self {
            volume,
            pitch,
            volume_range: InputRange::from(&config.volume),
            pitch_range: InputRange::from(&config.pitch),
            stop,
            worker: Some(worker),
        })
    }

    /// Volume in `0.0..=1.0`, `None` while no hand is in range
    pub fn volume(&self) -> Option<f64> {
        self.volume_range.normalise(self.volume.latest())
    }

    /// Pitch in `0.0..=1.0`, `None` while no hand is in range
    pub fn relative_pitch(&self) -> Option<f64> {
        self.pitch_range.normalise(self.pitch.latest())
    }

    /// Raw distances (volume, pitch) in metres
    pub fn distances(&self) -> (Option<f64>, Option<f64>) {
        (self.volume.latest(), self.pitch.latest())
    }

    /// Check if the sensor thread is still running
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Stop the sensor thread and report how it ended
    pub fn shutdown(mut self) -> Result<()> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Release);
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| anyhow!("sensor thread panicked"))?,
            None => Ok(()),
        }
    }
}

impl Drop for UserInput {
    fn drop(&mut self) {
        if let Err(e) = self.stop_and_join() {
            warn!("sensor thread: {:#}", e);
        }
    }
}

fn run_sensors<B: Board>(
    board: B,
    config: &ControllerConfig,
    volume: Arc<DistanceSignal>,
    pitch: Arc<DistanceSignal>,
    stop: Arc<AtomicBool>,
) -> Result<()> {
    let wiring = board
        .open(&config.volume.sensor, &config.pitch.sensor)
        .context("opening sensor pins")?;

    let volume = Channel {
        sensor: UltrasonicSensor::new(
            config.volume.sensor.clone(),
            wiring.volume.trigger,
            wiring.volume.echo,
        )
        .context("volume sensor")?,
        signal: volume,
    };
    let pitch = Channel {
        sensor: UltrasonicSensor::new(
            config.pitch.sensor.clone(),
            wiring.pitch.trigger,
            wiring.pitch.echo,
        )
        .context("pitch sensor")?,
        signal: pitch,
    };
    let (volume_sensor, pitch_sensor) = (volume.sensor.clone(), pitch.sensor.clone());
    let (volume_signal, pitch_signal) = (volume.signal.clone(), pitch.signal.clone());

    info!(
        "sensor thread running (speed of sound {:.1} m/s)",
        volume_sensor.speed_of_sound()
    );

    let mut scheduler = Scheduler::new(wiring.clock);
    let initial = tasks::initial(volume, pitch, stop, config.controller.stop_poll());
    scheduler.run(initial).context("sensor scheduler")?;

    let stats = scheduler.stats();
    info!(
        "sensor thread stopped: {} steps, {} sleeps, max lateness {:?}",
        stats.steps, stats.sleeps, stats.max_lateness
    );
    info!(
        "volume sensor: {} published, {:?}",
        volume_signal.updates(),
        volume_sensor.stats()
    );
    info!(
        "pitch sensor: {} published, {:?}",
        pitch_signal.updates(),
        pitch_sensor.stats()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use theremin_hal::sim::EchoResponse;
    use theremin_hal::PinError;

    use crate::board::sim::SimBoard;

    fn pulse_at(metres: f64) -> EchoResponse {
        let speed = theremin_drivers::sensor::speed_of_sound(20.0);
        EchoResponse::Pulse {
            delay: Duration::from_micros(100),
            width: Duration::from_secs_f64(2.0 * metres / speed),
        }
    }

    fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(20);
        while !done() {
            assert!(Instant::now() < deadline, "timed out waiting for sensor thread");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_normalise() {
        let range = InputRange::new(0.06, 0.4);
        assert_eq!(range.normalise(None), None);
        assert_eq!(range.normalise(Some(0.06)), Some(0.0));
        assert_eq!(range.normalise(Some(0.4)), Some(1.0));
        assert_eq!(range.normalise(Some(0.01)), Some(0.0));
        assert_eq!(range.normalise(Some(1.5)), Some(1.0));

        let mid = range.normalise(Some(0.23)).unwrap();
        assert!((mid - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_spawn_reports_positions() {
        let config = ControllerConfig::load(None).unwrap();
        let board = SimBoard {
            volume: pulse_at(0.2),
            pitch: EchoResponse::Silent,
        };

        let input = UserInput::spawn(board, &config).unwrap();
        wait_until(|| input.volume().is_some());

        let volume = input.volume().unwrap();
        assert!((volume - (0.2 - 0.06) / (0.4 - 0.06)).abs() < 0.01);
        assert_eq!(input.relative_pitch(), None);
        assert!(input.is_running());

        input.shutdown().unwrap();
    }

    #[test]
    fn test_hand_beyond_range_reads_absent() {
        let config = ControllerConfig::load(None).unwrap();
        let board = SimBoard {
            volume: pulse_at(1.0),
            pitch: pulse_at(0.2),
        };

        let input = UserInput::spawn(board, &config).unwrap();
        wait_until(|| input.volume.updates() > 0 && input.relative_pitch().is_some());

        // Not clamped to full volume: the echo outlasts the timeout
        assert_eq!(input.distances().0, None);
        assert_eq!(input.volume(), None);

        input.shutdown().unwrap();
    }

    #[test]
    fn test_pin_failure_ends_thread() {
        let config = ControllerConfig::load(None).unwrap();
        let board = SimBoard {
            volume: pulse_at(0.2),
            pitch: EchoResponse::Fault,
        };

        let input = UserInput::spawn(board, &config).unwrap();
        wait_until(|| !input.is_running());

        let err = input.shutdown().unwrap_err();
        let pin = err
            .chain()
            .find_map(|e| e.downcast_ref::<theremin_core::Error>())
            .copied();
        assert_eq!(pin, Some(theremin_core::Error::Pin(PinError::Unavailable(3))));
    }

    #[test]
    fn test_drop_stops_thread() {
        let config = ControllerConfig::load(None).unwrap();
        let board = SimBoard {
            volume: EchoResponse::Silent,
            pitch: EchoResponse::Silent,
        };

        let input = UserInput::spawn(board, &config).unwrap();
        let pitch = input.pitch.clone();
        wait_until(|| pitch.updates() > 0);
        drop(input);

        // Only the signal handle is left
        assert_eq!(Arc::strong_count(&pitch), 1);
    }
}
