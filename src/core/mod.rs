// src/core/mod.rs
//! Persistence, configuration and the remote mirror

pub mod asset_validator;
pub mod config_manager;
pub mod document_store;
pub mod remote_mirror;
pub mod slots;

pub use config_manager::ConfigManager;
pub use document_store::DocumentStore;
pub use remote_mirror::{GitHubMirror, MirrorError, RemoteMirror};
pub use slots::{open_slots, FileSlots, MemorySlots, SlotStore, SqliteSlots};
