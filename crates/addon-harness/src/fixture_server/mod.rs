//! HTTP front end for the fixture catalog.

mod config;
mod error;
mod router;
mod server;

pub use config::DEFAULT_MOCK_PORT;
pub use config::FixtureServerConfig;
pub use error::FixtureServerError;
pub use router::build_router;
pub use server::FixtureServerHandle;
pub use server::start_fixture_server;
