//! Vetrina turns a job posting into a channel-specific short-video asset and
//! walks it through generation, rendering, approval, and publishing.
//!
//! The pipeline builds a versioned manifest per channel placement, drives the
//! render through synchronous or long-running asynchronous providers, tracks
//! completion with in-process polling, and hands approved assets to
//! per-channel publish adapters. [`application::library::VideoLibraryService`]
//! is the public operation surface.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
