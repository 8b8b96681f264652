//! Nova - wake-word voice assistant
//!
//! This library provides the core of the Nova assistant:
//! - A voice session controller (capture lifecycle, wake word protocol)
//! - A keyword command classifier over a static knowledge base
//! - An HTTP API exposing the classifier, with a best-effort command log
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Front ends                        │
//! │   nova listen (mic / console)  │  web UI over HTTP   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Voice session                        │
//! │   Capture  │  Wake Word  │  Synthesis               │
//! └────────────────────┬────────────────────────────────┘
//!                      │ command
//! ┌────────────────────▼────────────────────────────────┐
//! │           Classifier (local or remote)               │
//! │   Ordered rules  │  Knowledge base  │  Command log   │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod voice;

pub use assistant::{Classifier, CommandResponse, Directive, classify};
pub use config::Config;
pub use daemon::Daemon;
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
