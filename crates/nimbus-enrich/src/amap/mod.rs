//! Amap (高德) REST provider for reverse geocoding and live weather.
//!
//! Every public lookup is infallible: failures are logged at WARN and
//! replaced by the documented fallback values from `nimbus_core::defaults`.

mod client;
mod types;

pub use client::{icon_for, AmapClient};
