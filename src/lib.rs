//! # Volley Poll Bot
//!
//! A Telegram bot for organizing volleyball trainings: it posts weekly
//! attendance polls on a schedule and tracks per-training sign-ups with
//! a capacity-bounded waitlist.
//!
//! ## Features
//! - Recurring poll schedules (training day + poll day + time per chat)
//! - Automatic poll posting and pinning on the configured weekday
//! - Training registration with a 12-person limit and FIFO waitlist
//! - Web API for the calendar, registrations, and admin configuration
//! - Invite-code gated web access
//! - Persistent storage with SQLite

/// Bot command handlers and message processing
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Application error taxonomy
pub mod error;
/// Background services: poll posting and health checks
pub mod services;
/// Utility functions for dates, weekdays, and validation
pub mod utils;
/// Web API surface (auth, calendar, admin)
pub mod web;
