//! Test Module
//!
//! Cross-module test suite for the FloodChat backend.
//!
//! ## Test Categories
//! - `brain_tests`: arbitration precedence and retrieval over the built-in catalog
//! - `supervisor_tests`: supervisor orchestration and narrator degradation

pub mod supervisor_tests;
