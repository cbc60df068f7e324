// Flowferry Engine — all business logic lives here.
// The command layer above is a thin boundary; nothing below knows about IPC.

pub mod audit;
pub mod auth;
pub mod cloud;
pub mod config;
pub mod http;
pub mod local;
pub mod migrate;
pub mod package;
pub mod paths;
pub mod platform;
