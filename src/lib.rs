//! SkillSync - A mentor-matching backend
//!
//! This library provides the core functionality for the SkillSync service:
//! user accounts with mentor profiles, a skills catalog, mentoring session
//! booking with an idempotency guard, mentor ratings, and session messages.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "demo")]
pub mod demo;
