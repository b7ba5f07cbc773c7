//! Interface to the underlying real-time engine.

use crate::{AgentType, CallConfig, EngineCallback, EngineError};
use serde::Deserialize;
use std::fmt;
use tokio::sync::mpsc;

/// Parameters for a single join attempt. Not retained after the attempt.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallParameters {
    pub rtc_token: String,
    #[serde(alias = "aiAgentInstanceId")]
    pub agent_instance_id: String,
    #[serde(alias = "aiAgentUserId")]
    pub agent_user_id: String,
    pub channel_id: String,
}

impl fmt::Debug for CallParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallParameters")
            .field("rtc_token", &mask_token(&self.rtc_token))
            .field("agent_instance_id", &self.agent_instance_id)
            .field("agent_user_id", &self.agent_user_id)
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// Masks a token for display.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

/// A real-time engine instance.
///
/// Implementations wrap a native SDK handle. Methods are called one at a time
/// under the bridge lock; callbacks go through the [`EngineCallbacks`] handed
/// to [`EngineFactory::create`] and may be fired from any thread, including
/// from inside these methods.
pub trait Engine: Send {
    /// Applies start parameters before a join.
    fn configure(&mut self, config: &CallConfig) -> Result<(), EngineError>;

    fn set_agent_type(&mut self, agent_type: AgentType) -> Result<(), EngineError>;

    /// Requests to join. Success only means the request was accepted.
    fn call(&mut self, params: &CallParameters) -> Result<(), EngineError>;

    /// Leaves the current call. Must tolerate racing an in-flight join.
    fn hangup(&mut self) -> Result<(), EngineError>;

    fn switch_microphone(&mut self, on: bool) -> Result<(), EngineError>;

    fn enable_speaker(&mut self, enable: bool) -> Result<bool, EngineError>;

    fn interrupt_speaking(&mut self) -> Result<bool, EngineError>;

    fn enable_voice_interrupt(&mut self, enable: bool) -> Result<bool, EngineError>;

    fn switch_robot_voice(&mut self, voice_id: &str) -> Result<bool, EngineError>;

    fn mute_local_camera(&mut self, mute: bool) -> Result<bool, EngineError>;

    fn is_local_camera_mute(&self) -> Result<bool, EngineError>;

    fn switch_camera(&mut self) -> Result<bool, EngineError>;

    /// Releases native resources. Called once on detach.
    fn release(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Constructs engine instances.
pub trait EngineFactory: Send + Sync {
    fn create(&self, user_id: &str, callbacks: EngineCallbacks) -> Result<Box<dyn Engine>, EngineError>;
}

/// Callback handle given to an engine.
///
/// Each method queues one [`EngineCallback`] without blocking. Calls after the
/// bridge has stopped listening are dropped and return false.
#[derive(Debug, Clone)]
pub struct EngineCallbacks {
    tx: mpsc::UnboundedSender<EngineCallback>,
}

impl EngineCallbacks {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<EngineCallback>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues a callback.
    pub fn emit(&self, callback: EngineCallback) -> bool {
        self.tx.send(callback).is_ok()
    }

    pub fn on_error_occurs(&self, code: i32) -> bool {
        self.emit(EngineCallback::Error { code })
    }

    pub fn on_call_begin(&self) -> bool {
        self.emit(EngineCallback::CallBegin)
    }

    pub fn on_call_end(&self) -> bool {
        self.emit(EngineCallback::CallEnd)
    }

    pub fn on_user_speaking(&self, is_speaking: bool) -> bool {
        self.emit(EngineCallback::UserSpeaking { is_speaking })
    }

    pub fn on_voice_volume_changed(&self, uid: &str, volume: i32) -> bool {
        self.emit(EngineCallback::VolumeChanged {
            uid: uid.to_string(),
            volume,
        })
    }

    pub fn on_voice_id_changed(&self, voice_id: &str) -> bool {
        self.emit(EngineCallback::VoiceIdChanged {
            voice_id: voice_id.to_string(),
        })
    }

    pub fn on_user_online(&self, uid: &str) -> bool {
        self.emit(EngineCallback::UserOnline { uid: uid.to_string() })
    }
}
