#![warn(missing_docs)]
//! Seekwatch is a marketplace monitoring tool that watches a seek list for
//! per-size order activity and pushes change reports to group webhooks.

pub mod cmd;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod http_client;
pub mod models;
pub mod persistence;
pub mod providers;
pub mod supervisor;
