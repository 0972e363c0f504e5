//! hirecache - client-side cache for hiring pipeline reports
//!
//! Memoizes document, written-test, interview and final reports per job
//! posting, with per-kind TTLs, a missing-report gate before the final report
//! is assembled, and manual invalidation.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod loader;
pub mod logging;
