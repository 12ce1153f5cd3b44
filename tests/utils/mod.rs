pub mod assertions;
pub mod setup;
pub mod viewer;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::PresenceAssertion;
#[allow(unused_imports)]
pub use setup::{TestServer, TestServerBuilder};
#[allow(unused_imports)]
pub use viewer::Viewer;
