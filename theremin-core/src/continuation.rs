//! Continuations
//!
//! A continuation is "what to do next" for one cooperative task: a boxed
//! closure that, given the scheduler, performs one step and returns the
//! following continuation. It is consumed by invoking it, so it runs at
//! most once.
//!
//! Three reserved values exist besides ordinary steps:
//!
//! - [`Continuation::exit`] stops the trampoline.
//! - [`Continuation::invalid`] is a placeholder for "nothing set yet";
//!   invoking it is a logic error.
//! - The scheduling continuation returned by `fork`/`yield_now`/`wait_for`
//!   runs the scheduler's next step.

use alloc::boxed::Box;
use core::fmt;

use crate::error::Error;
use crate::scheduler::Scheduler;

type StepFn<C> = Box<dyn FnOnce(&mut Scheduler<C>) -> Result<Continuation<C>, Error>>;

type CallbackFn<C, T> = Box<dyn FnOnce(T, &mut Scheduler<C>) -> Result<Continuation<C>, Error>>;

enum Kind<C> {
    Invalid,
    Exit,
    Schedule,
    Step(StepFn<C>),
}

/// Next unit of work of a cooperative task
pub struct Continuation<C> {
    kind: Kind<C>,
}

impl<C> Continuation<C> {
    /// Wrap a step function
    pub fn new<F>(step: F) -> Self
    where
        F: FnOnce(&mut Scheduler<C>) -> Result<Continuation<C>, Error> + 'static,
    {
        Self {
            kind: Kind::Step(Box::new(step)),
        }
    }

    /// Terminal sentinel: the trampoline stops when it reaches this
    pub const fn exit() -> Self {
        Self { kind: Kind::Exit }
    }

    /// Placeholder that fails with [`Error::InvalidContinuation`] when invoked
    pub const fn invalid() -> Self {
        Self {
            kind: Kind::Invalid,
        }
    }

    /// Run the scheduler's next step
    pub(crate) const fn schedule() -> Self {
        Self {
            kind: Kind::Schedule,
        }
    }

    /// Check for the terminal sentinel
    pub fn is_exit(&self) -> bool {
        matches!(self.kind, Kind::Exit)
    }

    /// Check for the invalid placeholder
    pub fn is_invalid(&self) -> bool {
        matches!(self.kind, Kind::Invalid)
    }

    /// Run exactly one step and return the next continuation
    ///
    /// Invoking [`Continuation::exit`] yields `exit` again.
    pub fn invoke(self, scheduler: &mut Scheduler<C>) -> Result<Continuation<C>, Error>
    where
        C: theremin_hal::Clock,
    {
        match self.kind {
            Kind::Invalid => Err(Error::InvalidContinuation),
            Kind::Exit => Ok(Continuation::exit()),
            Kind::Schedule => scheduler.step(),
            Kind::Step(step) => step(scheduler),
        }
    }
}

impl<C> Default for Continuation<C> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<C> fmt::Debug for Continuation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            Kind::Invalid => "Invalid",
            Kind::Exit => "Exit",
            Kind::Schedule => "Schedule",
            Kind::Step(_) => "Step",
        };
        f.debug_tuple("Continuation").field(&name).finish()
    }
}

/// Continuation that first receives a value
///
/// Used where a task hands a result to whoever asked for it, e.g. the
/// ranging driver delivering a distance.
pub struct Callback<C, T> {
    f: Option<CallbackFn<C, T>>,
}

impl<C, T> Callback<C, T> {
    /// Wrap a result handler
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(T, &mut Scheduler<C>) -> Result<Continuation<C>, Error> + 'static,
    {
        Self {
            f: Some(Box::new(f)),
        }
    }

    /// Placeholder whose invocation produces [`Continuation::invalid`]
    pub const fn invalid() -> Self {
        Self { f: None }
    }

    /// Check for the invalid placeholder
    pub fn is_invalid(&self) -> bool {
        self.f.is_none()
    }

    /// Deliver `value` and return the handler's continuation
    pub fn invoke(self, value: T, scheduler: &mut Scheduler<C>) -> Result<Continuation<C>, Error> {
        match self.f {
            Some(f) => f(value, scheduler),
            None => Ok(Continuation::invalid()),
        }
    }
}

impl<C, T> Default for Callback<C, T> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<C, T> fmt::Debug for Callback<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("valid", &self.f.is_some())
            .finish()
    }
}
