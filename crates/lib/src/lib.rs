//! buildpipe-lib: a linear build pipeline.
//!
//! A run compiles a source tree, merges static resources into the compiler
//! output, packages the result into a deterministic archive with an
//! embedded manifest, and publishes the archive's directory:
//! - `workspace`: idempotent output directory creation
//! - `compile`: the `Compiler` seam and its shell-command implementation
//! - `resources`: resource merging over compiler output
//! - `archive`: pattern selection and deterministic ZIP/JAR construction
//! - `publish`: the `Publisher` seam and its implementations
//! - `pipeline`: the state machine that runs the steps in order

pub mod archive;
pub mod compile;
pub mod config;
pub mod consts;
pub mod fs;
pub mod pipeline;
pub mod process;
pub mod publish;
pub mod resources;
pub mod util;
pub mod workspace;
