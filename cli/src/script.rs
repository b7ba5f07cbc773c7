//! Scripted bridge sessions against the simulated engine.
//!
//! A script is a list of steps. Each step either invokes a host command,
//! fires an engine callback, steers the simulated engine or detaches the
//! bridge. After every step the runner waits `settleMs` and collects the
//! events emitted so far, producing a [`Transcript`].
//!
//! ```yaml
//! name: basic call
//! steps:
//!   - invoke: { name: initEngine, args: { userId: u1 } }
//!   - invoke:
//!       name: call
//!       args: { rtcToken: t, agentInstanceId: a1, agentUserId: au1, channelId: c1 }
//!   - fire: { type: callBegin }
//!   - invoke: { name: hangup }
//!   - detach
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use aicall_bridge::logger::Logger;
use aicall_bridge::sim::SimController;
use aicall_bridge::{
    new_event_channel, Bridge, BridgeError, BridgeEvent, CallState, CommandValue, EngineCallback,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Context;

/// A scripted session.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub name: String,
    /// Steps are written as single-key maps (`- invoke: {...}`).
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

/// One script step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    /// Dispatches a host command.
    Invoke {
        name: String,
        #[serde(default)]
        args: Value,
    },
    /// Fires a callback from the current engine.
    Fire(EngineCallback),
    FailOn { op: String, message: String },
    PanicOn { op: String, message: String },
    FailCreate(String),
    ClearFailures,
    /// Makes the engine report call begin as soon as a join is accepted.
    AutoBegin(bool),
    EndOnHangup(bool),
    /// Waits for the given number of milliseconds.
    Sleep(u64),
    Detach,
}

/// Loads a script from a YAML or JSON file.
pub fn load_script(path: &str) -> anyhow::Result<Script> {
    let content = std::fs::read_to_string(path)?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");
    let script = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    Ok(script)
}

/// What happened while running a script, in order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub entries: Vec<TranscriptEntry>,
    pub final_state: CallState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TranscriptEntry {
    Result { command: String, value: CommandValue },
    Error { command: String, error: BridgeError },
    Event(BridgeEvent),
    /// A fired callback had no engine to deliver it.
    Undelivered { callback: EngineCallback },
    Detached,
}

impl Transcript {
    /// Returns the names of every emitted event.
    pub fn event_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                TranscriptEntry::Event(event) => Some(event.name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns the error codes of every failed command.
    pub fn error_codes(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                TranscriptEntry::Error { error, .. } => Some(error.kind.code()),
                _ => None,
            })
            .collect()
    }
}

/// Runs a script against a fresh bridge and simulated engine.
///
/// The bridge is detached at the end, so `final_state` is always
/// `uninitialized` unless teardown was skipped.
pub async fn run_script(script: &Script, ctx: &Context, logger: Arc<dyn Logger>) -> Transcript {
    let sim = SimController::new();
    let (sink, mut events) = new_event_channel(ctx.event_buffer);
    let bridge = Bridge::builder(Arc::new(sim.factory()), Arc::new(sink))
        .config(ctx.bridge.clone())
        .logger(logger)
        .build();
    let settle = Duration::from_millis(ctx.settle_ms);

    let mut entries = Vec::new();
    for step in &script.steps {
        match step {
            Step::Invoke { name, args } => {
                let entry = match bridge.dispatch(name, args).await {
                    Ok(value) => TranscriptEntry::Result {
                        command: name.clone(),
                        value,
                    },
                    Err(error) => TranscriptEntry::Error {
                        command: name.clone(),
                        error,
                    },
                };
                entries.push(entry);
            }
            Step::Fire(callback) => {
                if !sim.fire(callback.clone()) {
                    entries.push(TranscriptEntry::Undelivered {
                        callback: callback.clone(),
                    });
                }
            }
            Step::FailOn { op, message } => sim.fail_on(op, message),
            Step::PanicOn { op, message } => sim.panic_on(op, message),
            Step::FailCreate(message) => sim.fail_create(message),
            Step::ClearFailures => sim.clear_failures(),
            Step::AutoBegin(enabled) => sim.set_auto_begin(*enabled),
            Step::EndOnHangup(enabled) => sim.set_end_on_hangup(*enabled),
            Step::Sleep(ms) => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::Detach => {
                bridge.detach().await;
                entries.push(TranscriptEntry::Detached);
            }
        }
        tokio::time::sleep(settle).await;
        entries.extend(events.drain().into_iter().map(TranscriptEntry::Event));
    }

    bridge.detach().await;
    Transcript {
        name: script.name.clone(),
        entries,
        final_state: bridge.state().await,
    }
}
