//! Hardware-independent telemetry core for atrium
//!
//! This crate contains all platform-agnostic logic for the atrium sensor
//! station: composite readings, the hierarchical rollup store and its
//! aggregation cascade, the threshold/timeout watch registry with long-poll
//! delivery, report export, and the sampling seam.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts; the test suite runs entirely on the
//! host with the std time driver.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod export;
pub mod sampling;
pub mod station;
pub mod storage;
pub mod trigger;
