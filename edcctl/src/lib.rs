//! edcctl library: deployment lifecycle and DSP workflow.
//!
//! The binary in `main.rs` is a thin clap front end over [`commands`].

pub mod commands;
pub mod deploy;
pub mod process;
pub mod ui;
pub mod workflow;
