#![forbid(unsafe_code)]

//! Public entry point for the video archive site tools.
//!
//! The library turns a nested playlist tree plus a cache of downloaded video
//! metadata into a flat folder of static HTML pages. The binaries under
//! `src/bin` are thin wrappers around these modules.

pub mod config;
pub mod format;
pub mod metadata;
pub mod placeholder;
pub mod playlist;
pub mod process;
pub mod render;
pub mod site;
pub mod template;
pub mod video_cache;
