//! Pagemark Application
//!
//! Host integrations for the mark engine: DOM canvas bindings for the
//! browser and a scripted replay driver for native runs.

pub mod replay;

pub use replay::{PageSpec, ReplayError, ReplayOutcome, Script, ScriptEvent, run_script};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{WebMarkController, run_wasm};
