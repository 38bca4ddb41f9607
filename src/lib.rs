//! Core of the `bbrew` Homebrew dashboard: package data loading and caching, filtering,
//! command execution with streamed output, and Brewfile orchestration.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
