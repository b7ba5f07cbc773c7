//! Engine callbacks and the normalized host event schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Version of the host event envelope.
pub const EVENT_SCHEMA_VERSION: i32 = 1;

pub const EVENT_ON_ERROR: &str = "onError";
pub const EVENT_ON_CALL_BEGIN: &str = "onCallBegin";
pub const EVENT_ON_CALL_END: &str = "onCallEnd";
pub const EVENT_ON_USER_SPEAKING: &str = "onUserSpeaking";
pub const EVENT_ON_ROBOT_STATE_CHANGED: &str = "onRobotStateChanged";
pub const EVENT_ON_USER_ASR_SUBTITLE: &str = "onUserAsrSubtitleNotify";
pub const EVENT_ON_AGENT_SUBTITLE: &str = "onAIAgentSubtitleNotify";
pub const EVENT_ON_NETWORK_QUALITY: &str = "onNetworkQuality";
pub const EVENT_ON_VOLUME_CHANGED: &str = "onVolumeChanged";
pub const EVENT_ON_VOICE_ID_CHANGED: &str = "onVoiceIdChanged";
pub const EVENT_ON_VOICE_INTERRUPTED: &str = "onVoiceInterrupted";
pub const EVENT_ON_AGENT_VIDEO_AVAILABLE: &str = "onAgentVideoAvailable";
pub const EVENT_ON_AGENT_AUDIO_AVAILABLE: &str = "onAgentAudioAvailable";
pub const EVENT_ON_AVATAR_FIRST_FRAME: &str = "onAgentAvatarFirstFrameDrawn";
pub const EVENT_ON_USER_ONLINE: &str = "onUserOnLine";

/// State of the remote agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    Listening,
    Thinking,
    Speaking,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::Listening => "Listening",
            AgentState::Thinking => "Thinking",
            AgentState::Speaking => "Speaking",
        };
        f.write_str(s)
    }
}

/// Network quality reported per participant.
///
/// Hosts receive the ordinal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetworkQuality {
    Excellent,
    Good,
    Poor,
    Bad,
    VeryBad,
    Disconnect,
    #[default]
    Unknown,
}

impl NetworkQuality {
    pub fn ordinal(&self) -> u8 {
        match self {
            NetworkQuality::Excellent => 0,
            NetworkQuality::Good => 1,
            NetworkQuality::Poor => 2,
            NetworkQuality::Bad => 3,
            NetworkQuality::VeryBad => 4,
            NetworkQuality::Disconnect => 5,
            NetworkQuality::Unknown => 6,
        }
    }
}

/// One engine callback. Engines report through
/// [`EngineCallbacks`](crate::EngineCallbacks), which queues these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EngineCallback {
    Error {
        code: i32,
    },
    CallBegin,
    CallEnd,
    UserSpeaking {
        is_speaking: bool,
    },
    AgentStateChanged {
        #[serde(default)]
        old_state: Option<AgentState>,
        new_state: AgentState,
    },
    UserSubtitle {
        text: String,
        is_sentence_end: bool,
        sentence_id: i64,
        #[serde(default)]
        voice_print_status: Option<i32>,
    },
    AgentSubtitle {
        text: String,
        is_sentence_end: bool,
        user_asr_sentence_id: i64,
    },
    NetworkQualityChanged {
        uid: String,
        quality: NetworkQuality,
    },
    VolumeChanged {
        uid: String,
        volume: i32,
    },
    VoiceIdChanged {
        voice_id: String,
    },
    VoiceInterrupted {
        enabled: bool,
    },
    AgentVideoAvailable {
        available: bool,
    },
    AgentAudioAvailable {
        available: bool,
    },
    AgentAvatarFirstFrameDrawn,
    UserOnline {
        uid: String,
    },
}

/// Translates a callback into its host event name and payload.
pub fn normalize(callback: &EngineCallback) -> (&'static str, Value) {
    match callback {
        EngineCallback::Error { code } => (EVENT_ON_ERROR, json!({ "code": code })),
        EngineCallback::CallBegin => (EVENT_ON_CALL_BEGIN, json!({})),
        EngineCallback::CallEnd => (EVENT_ON_CALL_END, json!({})),
        EngineCallback::UserSpeaking { is_speaking } => {
            (EVENT_ON_USER_SPEAKING, json!({ "isSpeaking": is_speaking }))
        }
        EngineCallback::AgentStateChanged { old_state, new_state } => {
            let mut payload = json!({ "newState": new_state.to_string() });
            if let Some(old) = old_state {
                payload["oldState"] = Value::String(old.to_string());
            }
            (EVENT_ON_ROBOT_STATE_CHANGED, payload)
        }
        EngineCallback::UserSubtitle {
            text,
            is_sentence_end,
            sentence_id,
            voice_print_status,
        } => {
            let mut payload = json!({
                "text": text,
                "isSentenceEnd": is_sentence_end,
                "sentenceId": sentence_id,
            });
            if let Some(status) = voice_print_status {
                payload["voicePrintStatus"] = json!(status);
            }
            (EVENT_ON_USER_ASR_SUBTITLE, payload)
        }
        EngineCallback::AgentSubtitle {
            text,
            is_sentence_end,
            user_asr_sentence_id,
        } => (
            EVENT_ON_AGENT_SUBTITLE,
            json!({
                "text": text,
                "isSentenceEnd": is_sentence_end,
                "userAsrSentenceId": user_asr_sentence_id,
            }),
        ),
        EngineCallback::NetworkQualityChanged { uid, quality } => (
            EVENT_ON_NETWORK_QUALITY,
            json!({ "uid": uid, "quality": quality.ordinal() }),
        ),
        EngineCallback::VolumeChanged { uid, volume } => {
            (EVENT_ON_VOLUME_CHANGED, json!({ "uid": uid, "volume": volume }))
        }
        EngineCallback::VoiceIdChanged { voice_id } => {
            (EVENT_ON_VOICE_ID_CHANGED, json!({ "voiceId": voice_id }))
        }
        EngineCallback::VoiceInterrupted { enabled } => {
            (EVENT_ON_VOICE_INTERRUPTED, json!({ "enabled": enabled }))
        }
        EngineCallback::AgentVideoAvailable { available } => {
            (EVENT_ON_AGENT_VIDEO_AVAILABLE, json!({ "available": available }))
        }
        EngineCallback::AgentAudioAvailable { available } => {
            (EVENT_ON_AGENT_AUDIO_AVAILABLE, json!({ "available": available }))
        }
        EngineCallback::AgentAvatarFirstFrameDrawn => (EVENT_ON_AVATAR_FIRST_FRAME, json!({})),
        EngineCallback::UserOnline { uid } => (EVENT_ON_USER_ONLINE, json!({ "uid": uid })),
    }
}

/// A normalized event delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEvent {
    /// Schema version.
    #[serde(rename = "v")]
    pub version: i32,

    /// Emission sequence number, strictly increasing per bridge.
    pub seq: u64,

    /// Emission timestamp.
    #[serde(rename = "t", with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,

    /// Event name, e.g. `onCallBegin`.
    pub name: String,

    /// Event payload, always a JSON object.
    pub payload: Value,
}

impl BridgeEvent {
    /// Creates an event from a callback.
    pub fn from_callback(seq: u64, callback: &EngineCallback) -> Self {
        let (name, payload) = normalize(callback);
        Self {
            version: EVENT_SCHEMA_VERSION,
            seq,
            time: Utc::now(),
            name: name.to_string(),
            payload,
        }
    }
}

#[cfg(test)]
mod event_tests {
    use super::*;

    #[test]
    fn test_normalize_error() {
        let (name, payload) = normalize(&EngineCallback::Error { code: 1003 });
        assert_eq!(name, "onError");
        assert_eq!(payload, json!({ "code": 1003 }));
    }

    #[test]
    fn test_normalize_call_lifecycle() {
        assert_eq!(normalize(&EngineCallback::CallBegin), ("onCallBegin", json!({})));
        assert_eq!(normalize(&EngineCallback::CallEnd), ("onCallEnd", json!({})));
        assert_eq!(
            normalize(&EngineCallback::AgentAvatarFirstFrameDrawn),
            ("onAgentAvatarFirstFrameDrawn", json!({}))
        );
    }

    #[test]
    fn test_normalize_robot_state() {
        let (name, payload) = normalize(&EngineCallback::AgentStateChanged {
            old_state: Some(AgentState::Listening),
            new_state: AgentState::Thinking,
        });
        assert_eq!(name, "onRobotStateChanged");
        assert_eq!(payload, json!({ "newState": "Thinking", "oldState": "Listening" }));

        let (_, payload) = normalize(&EngineCallback::AgentStateChanged {
            old_state: None,
            new_state: AgentState::Speaking,
        });
        assert_eq!(payload, json!({ "newState": "Speaking" }));
    }

    #[test]
    fn test_normalize_subtitles() {
        let (name, payload) = normalize(&EngineCallback::UserSubtitle {
            text: "hello".to_string(),
            is_sentence_end: true,
            sentence_id: 3,
            voice_print_status: None,
        });
        assert_eq!(name, "onUserAsrSubtitleNotify");
        assert_eq!(payload, json!({ "text": "hello", "isSentenceEnd": true, "sentenceId": 3 }));

        let (_, payload) = normalize(&EngineCallback::UserSubtitle {
            text: "hi".to_string(),
            is_sentence_end: false,
            sentence_id: 4,
            voice_print_status: Some(2),
        });
        assert_eq!(payload["voicePrintStatus"], 2);

        let (name, payload) = normalize(&EngineCallback::AgentSubtitle {
            text: "how can I help".to_string(),
            is_sentence_end: false,
            user_asr_sentence_id: 3,
        });
        assert_eq!(name, "onAIAgentSubtitleNotify");
        assert_eq!(
            payload,
            json!({ "text": "how can I help", "isSentenceEnd": false, "userAsrSentenceId": 3 })
        );
    }

    #[test]
    fn test_normalize_participant_events() {
        let (name, payload) = normalize(&EngineCallback::NetworkQualityChanged {
            uid: "u1".to_string(),
            quality: NetworkQuality::Poor,
        });
        assert_eq!(name, "onNetworkQuality");
        assert_eq!(payload, json!({ "uid": "u1", "quality": 2 }));

        let (name, payload) = normalize(&EngineCallback::VolumeChanged {
            uid: "agent".to_string(),
            volume: 180,
        });
        assert_eq!(name, "onVolumeChanged");
        assert_eq!(payload, json!({ "uid": "agent", "volume": 180 }));

        let (name, payload) = normalize(&EngineCallback::UserOnline { uid: "au1".to_string() });
        assert_eq!(name, "onUserOnLine");
        assert_eq!(payload, json!({ "uid": "au1" }));
    }

    #[test]
    fn test_normalize_flags() {
        assert_eq!(
            normalize(&EngineCallback::UserSpeaking { is_speaking: true }),
            ("onUserSpeaking", json!({ "isSpeaking": true }))
        );
        assert_eq!(
            normalize(&EngineCallback::VoiceIdChanged { voice_id: "v2".to_string() }),
            ("onVoiceIdChanged", json!({ "voiceId": "v2" }))
        );
        assert_eq!(
            normalize(&EngineCallback::VoiceInterrupted { enabled: false }),
            ("onVoiceInterrupted", json!({ "enabled": false }))
        );
        assert_eq!(
            normalize(&EngineCallback::AgentVideoAvailable { available: true }),
            ("onAgentVideoAvailable", json!({ "available": true }))
        );
        assert_eq!(
            normalize(&EngineCallback::AgentAudioAvailable { available: false }),
            ("onAgentAudioAvailable", json!({ "available": false }))
        );
    }

    #[test]
    fn test_callback_tagged_json() {
        let cb: EngineCallback =
            serde_json::from_str(r#"{"type":"volumeChanged","uid":"u1","volume":42}"#).unwrap();
        assert_eq!(
            cb,
            EngineCallback::VolumeChanged {
                uid: "u1".to_string(),
                volume: 42
            }
        );

        let cb: EngineCallback = serde_json::from_str(r#"{"type":"callBegin"}"#).unwrap();
        assert_eq!(cb, EngineCallback::CallBegin);

        let cb: EngineCallback =
            serde_json::from_str(r#"{"type":"agentStateChanged","newState":"Speaking"}"#).unwrap();
        assert_eq!(
            cb,
            EngineCallback::AgentStateChanged {
                old_state: None,
                new_state: AgentState::Speaking
            }
        );
    }

    #[test]
    fn test_bridge_event_envelope() {
        let event = BridgeEvent::from_callback(7, &EngineCallback::VoiceInterrupted { enabled: true });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["v"], 1);
        assert_eq!(json["seq"], 7);
        assert_eq!(json["name"], "onVoiceInterrupted");
        assert!(json["t"].is_i64());
    }
}
