//! Background tasks owned by the runtime.
mod scheduler;

pub(crate) use scheduler::Scheduler;
