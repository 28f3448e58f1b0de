pub mod config;
pub mod deps;
pub mod paths;
pub mod progress;
pub mod requirements;
