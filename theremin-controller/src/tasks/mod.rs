//! Cooperative tasks of the sensor thread
//!
//! All of them run on one scheduler and hand control back at every wait or
//! echo poll.

pub mod sensor;
pub mod stop;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use theremin_core::Continuation;
use theremin_drivers::UltrasonicSensor;
use theremin_hal::{Clock, DirectionalPin, InputPin, OutputPin};

use crate::channels::DistanceSignal;

pub use sensor::sensor_task;
pub use stop::stop_task;

/// One sensor and the signal its readings go to
pub struct Channel<T, E> {
    pub sensor: UltrasonicSensor<T, E>,
    pub signal: Arc<DistanceSignal>,
}

/// First continuation of a run: fork both sensor tasks and the stop task
pub fn initial<T, E, C>(
    volume: Channel<T, E>,
    pitch: Channel<T, E>,
    stop: Arc<AtomicBool>,
    stop_poll: Duration,
) -> Continuation<C>
where
    T: OutputPin + DirectionalPin + 'static,
    E: InputPin + DirectionalPin + 'static,
    C: Clock + 'static,
{
    Continuation::new(move |sched| {
        let volume = sensor_task(volume.sensor, volume.signal);
        let pitch = sensor_task(pitch.sensor, pitch.signal);
        let _ = sched.fork(volume, pitch);
        Ok(sched.yield_now(stop_task(stop, stop_poll)))
    })
}
