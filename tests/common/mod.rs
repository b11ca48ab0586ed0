//! Common test utilities and helpers

pub mod fixtures;
pub mod mock_transport;
pub mod test_helpers;

pub use mock_transport::MockTransport;
pub use test_helpers::*;
