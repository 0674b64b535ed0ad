//! Background tasks.

pub mod maintenance;

pub use maintenance::spawn_maintenance;
