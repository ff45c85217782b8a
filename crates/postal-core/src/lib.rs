//! postal-core
//!
//! Core building blocks for the postal message bus: producers address
//! parcels of enveloped messages to named channels; workers resolve a
//! handler per message type, execute it and forward the remainder of the
//! parcel; every delivery is recorded in an append-only event log projected
//! into queryable status reports and per-topic certified notices.
//!
//! # Module layout
//! - **domain**: pure data model (ids, channels, envelopes, shared states,
//!   topics, tracking, shipment events, outcomes, errors)
//! - **typed**: `Message`/`Handler` traits, type erasure, `HandlerRegistry`
//! - **ports**: abstraction seams (`Courier`, tracking write/read,
//!   `ShipmentEventStore`, `Clock`, `IdGenerator`)
//! - **app**: `EnvelopeMachine`, `MessageDispatcher`, `PostOffice`,
//!   `ParcelTrackingSystem`, `WorkerGroup`
//! - **handlers**: built-in handlers (topic gating, no-ops)
//! - **impls**: in-memory implementations for development and tests

pub mod app;
pub mod domain;
pub mod handlers;
pub mod impls;
pub mod ports;
pub mod typed;
