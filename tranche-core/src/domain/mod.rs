//! Core domain types
//!
//! This module contains the structures used across Tranche crates.
//! The protocol layer only sees the generic pieces (work items, pages,
//! resource state); the client and CLI work with the concrete jobs, tasks
//! and pools of the compute-pool service.

pub mod job;
pub mod page;
pub mod pool;
pub mod state;
pub mod task;
pub mod work_item;
