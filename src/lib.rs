//! Ingest telemetry from Ginlong/Solis inverters.
//!
//! The inverter's data logger opens a TCP connection, sends one fixed-size
//! big-endian frame and goes quiet. This crate decodes such frames into an
//! [`InverterRecord`] and hands the record to a [`Publisher`], normally MQTT.
//!
//! - [`frame`] holds the wire layout and the length checks.
//! - [`record`] converts raw counters into engineering units.
//! - [`server`] runs the listener.
//! - [`publish`] abstracts over record sinks.

pub mod byte_order;
pub mod frame;
pub mod inspect;
pub mod metrics;
pub mod publish;
pub mod record;
pub mod server;

pub use frame::{FrameError, RawFrame};
pub use publish::{PublishError, Publisher};
pub use record::{InverterRecord, Status};
pub use server::InverterServer;
