//! HTTP surface for harperbot
//!
//! Exposes `GET /health`, `POST /chat` (alias `/chat-gpt-5`) and
//! `POST /react` over axum. All shared state is immutable and lives behind
//! an `Arc`.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::router;
pub use error::AppError;
pub use state::AppState;
