//! akt library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod config;
pub mod event_loop;
pub mod keymap;
pub mod pty;
pub mod signals;
pub mod terminal;
pub mod translate;
