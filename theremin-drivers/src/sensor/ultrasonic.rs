//! HC-SR04 style ultrasonic ranging
//!
//! One read is a run of pulse/echo cycles followed by a median filter:
//!
//! ```text
//! Prepare ─┬─────────────────────────────┬─> TriggerHigh ─> TriggerLow
//!          └─> StartInit ─(500 ms)─> EndInit ┘        (10 µs)     │
//!                                                                 v
//!   CalculateDistance <── ReadSample <── WaitLowEcho ⟲ <── WaitHighEcho ⟲
//!                            │
//!                            └──(more samples)──> TriggerHigh
//! ```
//!
//! The echo pin is busy-polled: each poll re-enqueues the state machine with
//! `yield_now`, so other sensors keep running in between. Waiting for the
//! rising edge gives up after the maximum travel time since the trigger;
//! waiting for the falling edge gives up after twice that and discards the
//! sample.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use heapless::Vec;
use log::{debug, warn};
use theremin_core::config::{ConfigError, SensorConfig, MAX_SAMPLES};
use theremin_core::{Callback, Continuation, Error, Scheduler};
use theremin_hal::{Clock, DirectionalPin, InputPin, Instant, OutputPin, PinDirection, PinError};

use super::median::median;

/// Settle time after configuring the pins, before the first pulse
pub const INIT_SETTLE: Duration = Duration::from_millis(500);

/// Width of the trigger pulse
pub const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// Speed of sound in dry air at 0 °C (m/s)
const SPEED_OF_SOUND_0C: f64 = 331.3;

/// 0 °C in kelvin
const ZERO_CELSIUS_K: f64 = 273.15;

/// Speed of sound in m/s at `celsius`
pub fn speed_of_sound(celsius: f64) -> f64 {
    SPEED_OF_SOUND_0C * (1.0 + celsius / ZERO_CELSIUS_K).sqrt()
}

/// Round-trip time of an echo from `max_distance_m` at `speed` m/s
///
/// `None` when the result is negative, NaN or does not fit a `Duration`.
pub fn max_travel_time(max_distance_m: f64, speed: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(2.0 * max_distance_m / speed).ok()
}

/// Step of the ranging protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Reset the sample accumulator
    Prepare,
    /// Configure pins, drive trigger low, let the sensor settle
    StartInit,
    /// Settling done
    EndInit,
    /// Raise the trigger
    TriggerHigh,
    /// Drop the trigger after the pulse width
    TriggerLow,
    /// Poll for the echo's rising edge
    WaitHighEcho,
    /// Poll for the echo's falling edge
    WaitLowEcho,
    /// Validate and store the measured echo width
    ReadSample,
    /// Median filter and convert to metres
    CalculateDistance,
}

/// What the scheduler should do after one phase
#[derive(Debug, Clone, Copy, PartialEq)]
enum Transition {
    /// Continue immediately in the given phase
    Next(Phase),
    /// Sleep, then continue
    Wait(Duration, Phase),
    /// Let other tasks run, then continue
    Yield(Phase),
    /// Read finished
    Done(Option<f64>),
}

/// Ranging counters, accumulated over the sensor's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangingStats {
    /// Completed reads
    pub reads: u64,
    /// Reads that produced no distance
    pub empty_reads: u64,
    /// Pulses whose echo had not risen within the travel time
    pub timeouts: u64,
    /// Timed-out pulses whose echo rose before the falling-edge wait gave up
    ///
    /// Such an echo is still measured; its width runs from the last low
    /// poll, so `ReadSample` may accept it.
    pub late_echoes: u64,
    /// Echoes rejected as too long or never falling
    pub discarded: u64,
    /// Echo polls during the last read
    pub last_polls: u32,
    /// Largest poll count of any read
    pub max_polls: u32,
}

struct Session<T, E> {
    trigger: T,
    echo: E,
    config: SensorConfig,
    speed: f64,
    max_travel: Duration,
    initialized: bool,
    pending: u32,
    samples: Vec<Duration, MAX_SAMPLES>,
    pulse_start: Instant,
    echo_low: Option<Instant>,
    echo_high: Option<Instant>,
    polls: u32,
    stats: RangingStats,
}

impl<T, E> Session<T, E>
where
    T: OutputPin + DirectionalPin,
    E: InputPin + DirectionalPin,
{
    fn advance(&mut self, phase: Phase, now: Instant) -> Result<Transition, PinError> {
        let transition = match phase {
            Phase::Prepare => {
                self.samples.clear();
                self.pending = self.config.samples;
                self.polls = 0;
                if self.initialized {
                    Transition::Next(Phase::TriggerHigh)
                } else {
                    Transition::Next(Phase::StartInit)
                }
            }
            Phase::StartInit => {
                self.echo.set_direction(PinDirection::Input)?;
                self.trigger.set_direction(PinDirection::Output)?;
                self.trigger.set_low()?;
                Transition::Wait(INIT_SETTLE, Phase::EndInit)
            }
            Phase::EndInit => {
                self.initialized = true;
                Transition::Next(Phase::TriggerHigh)
            }
            Phase::TriggerHigh => {
                self.echo_low = None;
                self.echo_high = None;
                self.trigger.set_high()?;
                self.pulse_start = now;
                Transition::Wait(TRIGGER_PULSE, Phase::TriggerLow)
            }
            Phase::TriggerLow => {
                self.trigger.set_low()?;
                Transition::Next(Phase::WaitHighEcho)
            }
            Phase::WaitHighEcho => {
                if now.saturating_duration_since(self.pulse_start) > self.max_travel {
                    self.echo_high = None;
                    self.stats.timeouts += 1;
                    debug!("gpio {}: no echo", self.config.echo_pin);
                    Transition::Next(Phase::WaitLowEcho)
                } else if self.echo.is_high()? {
                    self.echo_high = Some(now);
                    Transition::Next(Phase::WaitLowEcho)
                } else {
                    self.echo_low = Some(now);
                    self.polls += 1;
                    Transition::Yield(Phase::WaitHighEcho)
                }
            }
            Phase::WaitLowEcho => {
                let give_up = self.max_travel.saturating_mul(2);
                if now.saturating_duration_since(self.pulse_start) > give_up {
                    if self.echo_high.take().is_some() {
                        self.stats.discarded += 1;
                        warn!("gpio {}: echo never fell", self.config.echo_pin);
                    }
                    Transition::Next(Phase::ReadSample)
                } else if self.echo.is_high()? {
                    if self.echo_high.replace(now).is_none() {
                        self.stats.late_echoes += 1;
                        debug!("gpio {}: late echo", self.config.echo_pin);
                    }
                    self.polls += 1;
                    Transition::Yield(Phase::WaitLowEcho)
                } else {
                    Transition::Next(Phase::ReadSample)
                }
            }
            Phase::ReadSample => {
                if let (Some(low), Some(high)) = (self.echo_low, self.echo_high) {
                    let width = high.saturating_duration_since(low);
                    if width <= self.max_travel {
                        // Capacity is MAX_SAMPLES and config.samples never exceeds it
                        let _ = self.samples.push(width);
                    } else {
                        self.stats.discarded += 1;
                        warn!(
                            "gpio {}: echo of {:?} exceeds travel time",
                            self.config.echo_pin, width
                        );
                    }
                }

                self.pending = self.pending.saturating_sub(1);
                if self.pending > 0 {
                    Transition::Next(Phase::TriggerHigh)
                } else {
                    Transition::Next(Phase::CalculateDistance)
                }
            }
            Phase::CalculateDistance => {
                let distance = median(&mut self.samples)
                    .map(|width| width.as_secs_f64() * self.speed / 2.0);

                self.stats.reads += 1;
                if distance.is_none() {
                    self.stats.empty_reads += 1;
                }
                self.stats.last_polls = self.polls;
                self.stats.max_polls = self.stats.max_polls.max(self.polls);

                debug!(
                    "gpio {}: {} samples, {} polls, distance {:?}",
                    self.config.echo_pin,
                    self.samples.len(),
                    self.polls,
                    distance
                );
                Transition::Done(distance)
            }
        };
        Ok(transition)
    }
}

/// Ultrasonic range finder driven by the cooperative scheduler
///
/// Cloning yields another handle to the same sensor. Only one read may be
/// in flight per sensor at a time.
pub struct UltrasonicSensor<T, E> {
    session: Rc<RefCell<Session<T, E>>>,
}

impl<T, E> Clone for UltrasonicSensor<T, E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<T, E> UltrasonicSensor<T, E>
where
    T: OutputPin + DirectionalPin + 'static,
    E: InputPin + DirectionalPin + 'static,
{
    /// Create a sensor from a validated configuration
    ///
    /// The pins are not touched until the first read.
    pub fn new(config: SensorConfig, trigger: T, echo: E) -> Result<Self, Error> {
        config.validate()?;

        let speed = speed_of_sound(config.expected_temperature_c);
        let max_travel = max_travel_time(config.max_distance_m, speed)
            .ok_or(ConfigError::InvalidMaxDistance(config.max_distance_m))?;
        debug!(
            "ultrasonic trigger={} echo={}: {:.1} m/s, max travel {:?}",
            config.trigger_pin, config.echo_pin, speed, max_travel
        );

        Ok(Self {
            session: Rc::new(RefCell::new(Session {
                trigger,
                echo,
                config,
                speed,
                max_travel,
                initialized: false,
                pending: 0,
                samples: Vec::new(),
                pulse_start: Instant::ZERO,
                echo_low: None,
                echo_high: None,
                polls: 0,
                stats: RangingStats::default(),
            })),
        })
    }

    /// Start one read
    ///
    /// The returned continuation runs the protocol; when it completes,
    /// `callback` receives the median distance in metres, or `None` when no
    /// sample produced a usable echo.
    pub fn read_once<C>(&self, callback: Callback<C, Option<f64>>) -> Continuation<C>
    where
        C: Clock + 'static,
    {
        self.resume_at(Phase::Prepare, callback)
    }

    fn resume_at<C>(&self, phase: Phase, callback: Callback<C, Option<f64>>) -> Continuation<C>
    where
        C: Clock + 'static,
    {
        let sensor = self.clone();
        Continuation::new(move |sched| sensor.resume(phase, callback, sched))
    }

    fn resume<C>(
        &self,
        phase: Phase,
        callback: Callback<C, Option<f64>>,
        sched: &mut Scheduler<C>,
    ) -> Result<Continuation<C>, Error>
    where
        C: Clock + 'static,
    {
        // Edges are stamped when the pin is touched, not at step start
        let now = sched.clock().now().max(sched.now());
        let transition = self.session.borrow_mut().advance(phase, now)?;
        match transition {
            Transition::Next(next) => Ok(self.resume_at(next, callback)),
            Transition::Wait(duration, next) => {
                Ok(sched.wait_for(duration, self.resume_at(next, callback)))
            }
            Transition::Yield(next) => Ok(sched.yield_now(self.resume_at(next, callback))),
            Transition::Done(distance) => callback.invoke(distance, sched),
        }
    }

    /// Configuration the sensor was built from
    pub fn config(&self) -> SensorConfig {
        self.session.borrow().config.clone()
    }

    /// Speed of sound used for conversion (m/s)
    pub fn speed_of_sound(&self) -> f64 {
        self.session.borrow().speed
    }

    /// Longest echo accepted as a sample
    pub fn max_travel_time(&self) -> Duration {
        self.session.borrow().max_travel
    }

    /// Check if the pins have been configured and settled
    pub fn is_initialized(&self) -> bool {
        self.session.borrow().initialized
    }

    /// Counters since creation
    pub fn stats(&self) -> RangingStats {
        self.session.borrow().stats
    }
}
