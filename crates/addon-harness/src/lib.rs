#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Fixture server and scenario orchestrator for end-to-end testing of the addon service.

mod app;
pub mod fixture_server;
pub mod infra;
pub mod scenario;

pub use app::Application;
pub use app::FixtureServerApplication;
