//! Kapaladaru - flags Indian movies in a media library
//!
//! Periodically scans a movie library, asks a local LLM (grounded by a web
//! search) whether each new folder is an Indian movie, and for positive
//! answers sends an ntfy notification and optionally deletes the movie from
//! Radarr. Every folder is processed once; a marker file records completion.

pub mod app;
pub mod config;
pub mod jobs;
pub mod services;
