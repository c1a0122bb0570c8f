pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use config::AppConfig;
pub use error::{AdResult, AdServeError};
