pub mod articles;
pub mod chain;
pub mod config;
pub mod easing;
pub mod error_codes;
pub mod logging;
pub mod motion_value;
pub mod progress;
pub mod spring;
pub mod terminal;
