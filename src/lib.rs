//! A 3×3 dot-grid loading spinner widget for egui, with a fade and a
//! spiral animation style.

pub mod config;
pub mod egui_integration;
pub mod grid;
pub mod schedule;
pub mod spinner;

pub use config::{Animation, Icon};
pub use schedule::{Scheduler, Scope, ScopeId};
pub use spinner::Spinner;
