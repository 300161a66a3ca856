//! Common utilities shared across the analytics modules

pub mod env_loader;
pub mod numeric;

pub use env_loader::EnvLoader;
