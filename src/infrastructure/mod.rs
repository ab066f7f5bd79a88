//! Infrastructure Layer
//!
//! Cross-cutting concerns and infrastructure components.

pub mod request_throttle;
pub mod shutdown;

pub use request_throttle::{RequestThrottle, ThrottleConfig};
pub use shutdown::{shutdown_signal, ShutdownController};
