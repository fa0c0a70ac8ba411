//! Tranche Core
//!
//! Core types and abstractions shared by the Tranche crates.
//!
//! This crate contains:
//! - Domain types: Work items, acknowledgements, pages, cursors, resource state,
//!   and the jobs, tasks and pools exposed by the compute-pool service
//! - DTOs: Wire shapes exchanged with the service

pub mod domain;
pub mod dto;
