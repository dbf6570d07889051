//! `topup-api` — HTTP boundary for the topup workflow.

pub mod app;
pub mod config;
