//! Terminal client for a math question-answering backend.
//!
//! `state` holds the conversation store and its reducer, `net` talks to the
//! backend, `app` wires the two together, and `render`/`repl` are the
//! terminal front end.

pub mod app;
pub mod config;
pub mod net;
pub mod render;
pub mod repl;
pub mod state;

pub use app::{ChatController, Confirm};
pub use config::{ClientConfig, ConfigError};
pub use net::{ApiError, HttpMathApi, MathApi};
