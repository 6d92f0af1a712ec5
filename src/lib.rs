pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod feeds;
pub mod state;
pub mod submit;
pub mod view;
pub mod wallet;
