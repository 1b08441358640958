pub mod actions;
pub mod config;
pub mod core;
pub mod engine;
pub mod estimator;
pub mod filter;
pub mod hal;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod runtime;
pub mod trigger;
