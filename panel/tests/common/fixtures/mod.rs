//! Reusable test utilities:
//! - Mock Nimbus backend (wiremock)
//! - Panel state wired to a temp download dir and in-memory storage
//! - Record builders for agents, users and activity entries

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_nimbus;
pub mod test_config;
pub mod test_data;

pub use mock_nimbus::MockNimbusServer;
pub use test_config::TestPanel;
pub use test_data::*;
