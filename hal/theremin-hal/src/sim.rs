//! Deterministic pin and clock simulation
//!
//! A [`SimBench`] owns a virtual timeline shared by a [`SimClock`] and any
//! number of simulated ultrasonic sensors. Time only moves when the clock
//! is read (a fixed tick per read, standing in for the cost of a poll) or
//! when the scheduler sleeps, so tests are exact and instantaneous.
//!
//! Everything here is single-threaded (`Rc` + `Cell`), matching the
//! scheduler it is meant to drive.

use alloc::rc::Rc;
use core::cell::Cell;
use core::time::Duration;

use crate::clock::{Clock, Instant};
use crate::gpio::{DirectionalPin, InputPin, OutputPin, PinDirection, PinError};

/// How a simulated echo line answers a trigger pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoResponse {
    /// Echo never rises (nothing in range)
    Silent,
    /// Echo rises `delay` after the trigger edge and stays high for `width`
    Pulse { delay: Duration, width: Duration },
    /// Echo rises `delay` after the trigger edge and never falls
    StuckHigh { delay: Duration },
    /// Every read fails
    Fault,
}

struct Timeline {
    now: Cell<u64>,
    tick: u64,
    sleeps: Cell<u32>,
    slept: Cell<u64>,
}

/// Virtual timeline shared by the simulated clock and pins
#[derive(Clone)]
pub struct SimBench {
    timeline: Rc<Timeline>,
    next_pin: Rc<Cell<u32>>,
}

impl SimBench {
    /// Create a bench whose clock advances `tick` on every read
    pub fn new(tick: Duration) -> Self {
        Self {
            timeline: Rc::new(Timeline {
                now: Cell::new(0),
                tick: tick.as_nanos() as u64,
                sleeps: Cell::new(0),
                slept: Cell::new(0),
            }),
            next_pin: Rc::new(Cell::new(0)),
        }
    }

    /// Clock attached to this bench
    pub fn clock(&self) -> SimClock {
        SimClock {
            timeline: self.timeline.clone(),
        }
    }

    /// Add a simulated sensor (trigger + echo pair)
    pub fn sensor(&self, response: EchoResponse) -> SimSensor {
        let trigger_pin = self.next_pin.get();
        self.next_pin.set(trigger_pin + 2);

        let line = Rc::new(SimLine {
            trigger_pin,
            echo_pin: trigger_pin + 1,
            response: Cell::new(response),
            trigger_level: Cell::new(false),
            last_rise: Cell::new(None),
            pulses: Cell::new(0),
            echo_reads: Cell::new(0),
            trigger_direction: Cell::new(None),
            echo_direction: Cell::new(None),
        });

        SimSensor {
            trigger: SimTrigger {
                timeline: self.timeline.clone(),
                line: line.clone(),
            },
            echo: SimEcho {
                timeline: self.timeline.clone(),
                line: line.clone(),
            },
            line,
        }
    }

    /// Current virtual time, without advancing it
    pub fn now(&self) -> Instant {
        Instant::from_nanos(self.timeline.now.get())
    }

    /// Move virtual time forward
    pub fn advance(&self, duration: Duration) {
        let now = self.timeline.now.get();
        self.timeline.now.set(now + duration.as_nanos() as u64);
    }

    /// Number of times the clock was asked to sleep
    pub fn sleep_count(&self) -> u32 {
        self.timeline.sleeps.get()
    }

    /// Total time spent sleeping
    pub fn slept(&self) -> Duration {
        Duration::from_nanos(self.timeline.slept.get())
    }
}

/// Simulated monotonic clock
pub struct SimClock {
    timeline: Rc<Timeline>,
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        let now = self.timeline.now.get();
        self.timeline.now.set(now + self.timeline.tick);
        Instant::from_nanos(now)
    }

    fn sleep(&mut self, duration: Duration) {
        let nanos = duration.as_nanos() as u64;
        self.timeline.now.set(self.timeline.now.get() + nanos);
        self.timeline.sleeps.set(self.timeline.sleeps.get() + 1);
        self.timeline.slept.set(self.timeline.slept.get() + nanos);
    }
}

/// State of one simulated sensor
pub struct SimLine {
    trigger_pin: u32,
    echo_pin: u32,
    response: Cell<EchoResponse>,
    trigger_level: Cell<bool>,
    last_rise: Cell<Option<Instant>>,
    pulses: Cell<u32>,
    echo_reads: Cell<u32>,
    trigger_direction: Cell<Option<PinDirection>>,
    echo_direction: Cell<Option<PinDirection>>,
}

impl SimLine {
    /// Change how the echo answers subsequent pulses
    pub fn set_response(&self, response: EchoResponse) {
        self.response.set(response);
    }

    /// Number of trigger pulses (rising edges) seen
    pub fn pulses(&self) -> u32 {
        self.pulses.get()
    }

    /// Number of echo reads performed
    pub fn echo_reads(&self) -> u32 {
        self.echo_reads.get()
    }

    /// Current trigger level
    pub fn trigger_level(&self) -> bool {
        self.trigger_level.get()
    }

    /// Direction last configured on the trigger pin
    pub fn trigger_direction(&self) -> Option<PinDirection> {
        self.trigger_direction.get()
    }

    /// Direction last configured on the echo pin
    pub fn echo_direction(&self) -> Option<PinDirection> {
        self.echo_direction.get()
    }
}

/// Simulated sensor: trigger pin, echo pin and a probe into their state
pub struct SimSensor {
    pub trigger: SimTrigger,
    pub echo: SimEcho,
    pub line: Rc<SimLine>,
}

/// Simulated trigger output
pub struct SimTrigger {
    timeline: Rc<Timeline>,
    line: Rc<SimLine>,
}

impl OutputPin for SimTrigger {
    fn set_high(&mut self) -> Result<(), PinError> {
        if !self.line.trigger_level.get() {
            let now = Instant::from_nanos(self.timeline.now.get());
            self.line.last_rise.set(Some(now));
            self.line.pulses.set(self.line.pulses.get() + 1);
        }
        self.line.trigger_level.set(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), PinError> {
        self.line.trigger_level.set(false);
        Ok(())
    }
}

impl DirectionalPin for SimTrigger {
    fn set_direction(&mut self, direction: PinDirection) -> Result<(), PinError> {
        self.line.trigger_direction.set(Some(direction));
        Ok(())
    }
}

/// Simulated echo input
pub struct SimEcho {
    timeline: Rc<Timeline>,
    line: Rc<SimLine>,
}

impl InputPin for SimEcho {
    fn is_high(&mut self) -> Result<bool, PinError> {
        self.line.echo_reads.set(self.line.echo_reads.get() + 1);

        let now = Instant::from_nanos(self.timeline.now.get());
        let Some(rise) = self.line.last_rise.get() else {
            return Ok(false);
        };

        match self.line.response.get() {
            EchoResponse::Silent => Ok(false),
            EchoResponse::Pulse { delay, width } => {
                let start = rise + delay;
                Ok(now >= start && now < start + width)
            }
            EchoResponse::StuckHigh { delay } => Ok(now >= rise + delay),
            EchoResponse::Fault => Err(PinError::Io(self.line.echo_pin)),
        }
    }
}

impl DirectionalPin for SimEcho {
    fn set_direction(&mut self, direction: PinDirection) -> Result<(), PinError> {
        if self.line.response.get() == EchoResponse::Fault {
            return Err(PinError::Unavailable(self.line.echo_pin));
        }
        self.line.echo_direction.set(Some(direction));
        Ok(())
    }
}

impl SimTrigger {
    /// Pin number assigned by the bench
    pub fn pin(&self) -> u32 {
        self.line.trigger_pin
    }
}
