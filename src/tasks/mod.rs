//! Background Tasks Module
//!
//! Contains background tasks that run periodically during process lifetime.
//!
//! # Tasks
//! - TTL Sweep: removes expired entries at configured intervals, so unused
//!   keys don't linger until their next access

mod sweep;

pub use sweep::spawn_sweep_task;
