//! # hap-adapter-salvo
//!
//! Salvo adapter: watches a set of topics and, when one receives a
//! configured trigger value, publishes every action of that trigger followed
//! by a revertive naming the trigger.

pub mod config;
pub mod driver;

pub use config::{Salvo, SalvoAction, SalvoConfig, Trigger};
pub use driver::SalvoDriver;
