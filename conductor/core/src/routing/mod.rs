//! Request Routing
//!
//! Maps the user's selected [`ChatMode`] to a backend endpoint. Routing is a
//! pure lookup consumed by the exchange driver; it holds no state.

pub mod mode;

pub use mode::{ChatMode, UnknownMode};
