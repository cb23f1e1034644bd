//! When should I leave?
//!
//! Looks up the next public-transport connection between home and work
//! (mornings towards work, afternoons towards home), caches the journey API
//! response for a few minutes, and renders how long until the connection
//! leaves for a terminal, a desktop widget, an embedded display or a browser.

pub mod cache;
pub mod config;
pub mod duration;
pub mod fetcher;
pub mod render;
pub mod transport;
pub mod web;
