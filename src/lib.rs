//! cvfolio: a personal resume site. One JSON document drives the public page and the
//! admin API, kept in local slots and mirrored to a GitHub repository.

/// Crate logging entry point, forwarding to `tracing`
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}

pub mod cli;
pub mod contact;
pub mod controller;
pub mod core;
pub mod hydration;
pub mod render;
pub mod session;
pub mod types;
pub mod utils;
pub mod web;

#[cfg(test)]
mod testing;

pub use controller::{AdminSnapshot, ControllerError, FormController, SyncStatus};
pub use crate::core::{ConfigManager, DocumentStore, GitHubMirror, MirrorError, RemoteMirror};
pub use hydration::{hydrate_front, HydrationOutcome};
pub use render::{render_page, RenderContext};
pub use session::SessionGate;
pub use types::ResumeDocument;
pub use web::start_web_server;
