//! Data Transfer Objects for the compute-pool service
//!
//! These are the JSON shapes sent to and received from the service. They are
//! converted into domain types at the client boundary so the rest of the
//! workspace never deals with wire naming.

pub mod job;
pub mod list;
pub mod pool;
pub mod task;
