#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Pure request-to-response mapping for the fixture server.
//!
//! Nothing in this crate performs I/O. Identical requests always produce
//! identical responses, apart from the `created` timestamp of chat
//! completions.

mod catalog;
mod chat;
mod entity;
mod error;
mod request;
mod route;

pub use catalog::respond_to;
pub use catalog::respond_to_at;
pub use chat::SERIES_MARKER;
pub use entity::Entity;
pub use entity::MediaId;
pub use entity::MediaKind;
pub use entity::synthesize_external_id;
pub use error::CatalogError;
pub use request::FixtureMethod;
pub use request::FixtureRequest;
pub use request::FixtureResponse;
pub use route::Route;
pub use route::RouteMatch;
