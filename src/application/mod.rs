//! Application services layer scaffolding.

pub mod capabilities;
pub mod error;
pub mod library;
pub mod manifest;
pub mod poller;
pub mod publish;
pub mod render;
pub mod repos;
