//! Run engine.
//!
//! Contains the driver that executes one approximation run per job on
//! its own task, updating the registry and broadcasting sampled
//! progress frames.

pub mod runner;
