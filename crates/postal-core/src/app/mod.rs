//! Application logic: envelope machine, dispatch engine, post office,
//! tracking system, worker pool.

pub mod active;
pub mod dispatcher;
pub mod envelope_machine;
pub mod post_office;
pub mod tracking_system;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use active::ActiveMessageTracker;
pub use dispatcher::MessageDispatcher;
pub use envelope_machine::EnvelopeMachine;
pub use post_office::{PostOffice, SendOptions, SendParcels};
pub use tracking_system::ParcelTrackingSystem;
pub use worker::WorkerGroup;
