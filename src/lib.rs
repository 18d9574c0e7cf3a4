//! tsec: a terminal browser for namespaced secrets.
//!
//! The [`controller`] owns all view state and is driven one message at a time
//! by the [`runtime`], which performs store, clipboard and config work off the
//! UI thread.

pub mod app;
pub mod audit;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod crypto;
pub mod guard;
pub mod models;
pub mod runtime;
pub mod secret;
pub mod storage;
pub mod store;
pub mod template;
pub mod tree;
pub mod ui;
