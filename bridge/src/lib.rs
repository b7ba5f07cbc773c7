//! Call session bridge between a host application and a real-time AI agent
//! engine.
//!
//! The host sends named commands with JSON arguments to a [`Bridge`]; the
//! bridge validates them against the call lifecycle ([`CallState`]) and
//! forwards them to an [`Engine`]. Engine callbacks are normalized into
//! [`BridgeEvent`]s and delivered through an [`EventSink`].
//!
//! - [`Bridge`] and [`BridgeBuilder`]: command dispatch and session lifecycle
//! - [`Command`] and [`CommandValue`]: parsed host commands and their results
//! - [`Engine`], [`EngineFactory`], [`EngineCallbacks`]: the engine seam
//! - [`EngineCallback`], [`BridgeEvent`], [`normalize`]: event translation
//! - [`EventSink`] and [`new_event_channel`]: outbound transport
//! - [`sim`]: a simulated engine for tests and scripted sessions
//!
//! # Example
//!
//! ```rust
//! use aicall_bridge::sim::SimController;
//! use aicall_bridge::{new_event_channel, Bridge, CallState};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sim = SimController::new();
//! let (sink, _events) = new_event_channel(16);
//! let bridge = Bridge::new(Arc::new(sim.factory()), Arc::new(sink));
//!
//! bridge.dispatch("initEngine", &json!({ "userId": "u1" })).await.unwrap();
//! assert_eq!(bridge.state().await, CallState::Idle);
//! bridge.detach().await;
//! # }
//! ```

mod error;
mod state;
mod config;
mod event;
mod engine;
mod command;
mod adapter;
mod channel;
mod bridge;
pub mod logger;
pub mod sim;

pub use error::*;
pub use state::{AgentType, CallState};
pub use config::*;
pub use event::*;
pub use engine::*;
pub use command::*;
pub use channel::*;
pub use bridge::{Bridge, BridgeBuilder};
