//! HTTP surface: placement resolution (JSON and rendered HTML), impression
//! beacons, click registration and redirect, plus operational endpoints.

pub mod render;
pub mod rest;
pub mod server;
pub mod swagger;

pub use rest::AppState;
pub use server::ApiServer;
