//! Sensor task
//!
//! Reads one sensor forever, publishing every result.

use std::sync::Arc;

use theremin_core::{Callback, Continuation, Scheduler};
use theremin_drivers::UltrasonicSensor;
use theremin_hal::{Clock, DirectionalPin, InputPin, OutputPin};

use crate::channels::DistanceSignal;

/// Continuation that reads `sensor`, publishes to `signal`, and repeats
pub fn sensor_task<T, E, C>(sensor: UltrasonicSensor<T, E>, signal: Arc<DistanceSignal>) -> Continuation<C>
where
    T: OutputPin + DirectionalPin + 'static,
    E: InputPin + DirectionalPin + 'static,
    C: Clock + 'static,
{
    let next = sensor.clone();
    sensor.read_once(Callback::new(move |distance, _: &mut Scheduler<C>| {
        signal.publish(distance);
        Ok(sensor_task(next, signal))
    }))
}
