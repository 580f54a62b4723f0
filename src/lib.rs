//! Sahayak: a voice-and-text companion for elderly users.
//!
//! The library is headless: mode registry, conversation controller,
//! location dialog and the generative-language client. The Dioxus shell in
//! [`ui`] is compiled with the `web`, `desktop` or `mobile` feature.

pub mod ai;
pub mod capability;
pub mod config;
pub mod conversation;
pub mod location;
pub mod modes;
pub mod page;
pub mod render;
pub mod reveal;
pub mod storage;
pub mod types;

#[cfg(feature = "ui")]
pub mod ui;
#[cfg(feature = "ui")]
pub mod views;
