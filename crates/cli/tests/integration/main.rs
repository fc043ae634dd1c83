//! CLI integration tests.
//!
//! These drive the `buildpipe` binary against scratch projects using a shell
//! stand-in for the compiler, so they only run on Unix.

#![cfg(unix)]

mod common;
mod pipeline_tests;
