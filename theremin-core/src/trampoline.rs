//! Trampoline
//!
//! Runs a continuation chain iteratively: invoke the current continuation,
//! replace it with the one it returns, repeat until `exit`. Stack depth
//! stays constant no matter how long the chain is.

use log::debug;
use theremin_hal::Clock;

use crate::continuation::Continuation;
use crate::error::Error;
use crate::scheduler::Scheduler;

/// Drive `initial` on an existing scheduler
///
/// Returns `Ok(())` once the chain reaches [`Continuation::exit`], or the
/// first error any step produced.
pub fn drive<C: Clock>(scheduler: &mut Scheduler<C>, initial: Continuation<C>) -> Result<(), Error> {
    let mut current = initial;
    while !current.is_exit() {
        current = current.invoke(scheduler)?;
    }
    debug!("trampoline exit after {} steps", scheduler.stats().steps);
    Ok(())
}

/// Create a scheduler on `clock`, drive `initial` on it, then tear it down
///
/// Queued work left behind at exit is dropped with the scheduler.
pub fn run<C: Clock>(clock: C, initial: Continuation<C>) -> Result<(), Error> {
    let mut scheduler = Scheduler::new(clock);
    drive(&mut scheduler, initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use theremin_hal::sim::{SimBench, SimClock};

    fn chain(remaining: u32) -> Continuation<SimClock> {
        Continuation::new(move |_| {
            Ok(if remaining == 0 {
                Continuation::exit()
            } else {
                chain(remaining - 1)
            })
        })
    }

    #[test]
    fn test_million_step_chain() {
        let bench = SimBench::new(Duration::ZERO);
        assert_eq!(run(bench.clock(), chain(1_000_000)), Ok(()));
    }

    #[test]
    fn test_exit_returns_ok() {
        let bench = SimBench::new(Duration::ZERO);
        assert_eq!(run(bench.clock(), Continuation::exit()), Ok(()));
    }

    #[test]
    fn test_invalid_fails() {
        let bench = SimBench::new(Duration::ZERO);
        assert_eq!(
            run(bench.clock(), Continuation::invalid()),
            Err(Error::InvalidContinuation)
        );
    }

    #[test]
    fn test_exit_leaves_queued_work() {
        let bench = SimBench::new(Duration::ZERO);
        let mut sched = Scheduler::new(bench.clock());

        let forever = Continuation::new(|_| Ok(Continuation::invalid()));
        drive(
            &mut sched,
            Continuation::new(move |s| {
                let _ = s.wait_for(Duration::from_secs(60), forever);
                Ok(Continuation::exit())
            }),
        )
        .unwrap();

        assert_eq!(sched.waiting_len(), 1);
        assert_eq!(bench.sleep_count(), 0);
    }
}
