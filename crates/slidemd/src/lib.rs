//! Markdown slide viewer and editor.
//!
//! A document is split into frontmatter and body; the body renders to a
//! flat sequence of slide fragments that a navigator steps through one at a
//! time. Documents travel as compressed share tokens, either inline in a URL
//! fragment or through a hash store.

pub mod app;
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod deck;
pub mod frontmatter;
pub mod logging;
pub mod navigator;
pub mod remote;
pub mod render;
pub mod session;
pub mod theme;
