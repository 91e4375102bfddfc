//! On-screen keyboard with a keystroke heat map and a fading press glow.
//!
//! Embed [`widget::HeatKeyboard`] in a crossterm application, or let a form
//! designer discover it through [`descriptor::WidgetDescriptor`]. The
//! `heatboard` binary wraps the same pieces in a demo and a few CLI tools.

pub mod colors;
pub mod config;
pub mod demo;
pub mod descriptor;
pub mod error;
pub mod keymap;
pub mod settings;
pub mod tap;
pub mod terminal;
pub mod widget;
