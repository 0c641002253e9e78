//! Generic HTTP handlers shared by services.

pub mod health;

pub use health::health_check;
