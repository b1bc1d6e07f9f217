#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod time;
pub mod trend;

pub use error::Error;
pub use time::Clock;
