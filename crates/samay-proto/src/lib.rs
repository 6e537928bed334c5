pub mod catalog;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod normalizer;
pub mod platform;
pub mod poller;
pub mod protocol;
pub mod state;
