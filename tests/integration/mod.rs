//! Integration test suite for beany.
//!
//! These tests drive the whole console (engine, registry, session, bulk
//! operations and confirmation prompts) from scripted operator input.
//!
//! # Test Categories
//!
//! - `scenarios`: operator sessions from connect to exit
//! - `confirmation`: yes/no prompts and command history
//! - `bulk`: delete-all and kick through the console
//! - `paging`: inline vs paged output
//!
//! # CI Compatibility
//!
//! An in-memory mock server stands in for beanstalkd, so no network
//! access is needed.

mod fixtures;

mod bulk;
mod confirmation;
mod paging;
mod scenarios;
