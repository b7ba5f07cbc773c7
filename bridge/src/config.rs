//! Bridge configuration.

use crate::AgentType;
use serde::{Deserialize, Serialize};

/// Default lowest engine error code treated as call-ending.
pub const DEFAULT_FATAL_ERROR_FLOOR: i32 = 1000;

/// Engine start parameters applied before each join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallConfig {
    pub enable_voice_interrupt: bool,
    pub enable_speaker: bool,
    pub mute_microphone_on_start: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_voice_id: Option<String>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            enable_voice_interrupt: true,
            enable_speaker: true,
            mute_microphone_on_start: false,
            agent_voice_id: None,
        }
    }
}

/// Configuration for a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Agent type used until the host changes it.
    pub agent_type: AgentType,

    /// Parameters handed to the engine before every join.
    pub call: CallConfig,

    /// Engine errors with a code at or above this value end the call.
    /// `None` disables the behavior.
    pub fatal_error_floor: Option<i32>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            agent_type: AgentType::default(),
            call: CallConfig::default(),
            fatal_error_floor: Some(DEFAULT_FATAL_ERROR_FLOOR),
        }
    }
}

impl BridgeConfig {
    /// Reports whether an engine error code ends the current call.
    pub fn is_fatal(&self, code: i32) -> bool {
        self.fatal_error_floor.is_some_and(|floor| code >= floor)
    }
}
