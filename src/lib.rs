//! Declarative UI-test automation.
//!
//! Apps, screens and actions are defined in an [`appmap::AppMap`]; scenarios
//! are ordered steps over those actions. The [`automator::Automator`] selects
//! scenarios by tag or name, checks device support, and runs each one with
//! screen assertions before every step and deferred-failure aggregation.
pub mod appmap;
pub mod automator;
pub mod cli;
pub mod common;
pub mod config;
pub mod describe;
pub mod diagnostics;
pub mod error;
pub mod sample;
pub mod util;
pub mod wait;
pub mod workflow;
