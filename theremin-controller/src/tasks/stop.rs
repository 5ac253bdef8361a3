//! Stop task
//!
//! The only way a run ends: once the stop flag is raised, the next poll
//! returns `exit` and the trampoline returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::info;
use theremin_core::{Continuation, Scheduler};
use theremin_hal::Clock;

/// Continuation that checks `stop` every `poll`
pub fn stop_task<C>(stop: Arc<AtomicBool>, poll: Duration) -> Continuation<C>
where
    C: Clock + 'static,
{
    Continuation::new(move |sched: &mut Scheduler<C>| {
        if stop.load(Ordering::Acquire) {
            info!("stop requested, leaving scheduler");
            return Ok(Continuation::exit());
        }
        Ok(sched.wait_for(poll, stop_task(stop, poll)))
    })
}
