//! Pagemark Render Library
//!
//! Stroke styling and surface implementations for Pagemark.
//! The default implementation records marks into a Vello scene.

mod style;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use style::MarkStyle;

#[cfg(feature = "vello-renderer")]
pub use vello_impl::{SceneSurface, SceneSurfaces};
