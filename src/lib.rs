//! Prodia tools library
//!
//! Modules:
//! - `tools`: Function-calling tools (`drawPainting`, `drawSeedream4`, `editImage`,
//!   `editSeedream4`) and the registry that dispatches calls to them.
//! - `prodia`: Thin client for the Prodia v2 job endpoint plus the retry policy.
//! - `ratio`: Best-fit aspect-ratio matching and image dimension probing.
//! - `hosting`: "Store bytes, return URL" uploaders.
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `ProdiaClient`,
//! `ToolRegistry`, `ToolContext` and `select_closest_ratio`.
pub mod api;
pub mod prodia;
pub mod ratio;
pub mod hosting;
pub mod tools;
pub mod config;
pub mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use prodia::client::ProdiaClient;
pub use ratio::select_closest_ratio;
pub use tools::{ToolCall, ToolContext, ToolOutput, ToolRegistry};
