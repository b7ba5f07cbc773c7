//! Host command parsing.

use crate::{AgentType, BridgeError, CallParameters, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CMD_INIT_ENGINE: &str = "initEngine";
pub const CMD_CALL: &str = "call";
pub const CMD_HANGUP: &str = "hangup";
pub const CMD_SWITCH_MICROPHONE: &str = "switchMicrophone";
pub const CMD_ENABLE_SPEAKER: &str = "enableSpeaker";
pub const CMD_INTERRUPT_SPEAKING: &str = "interruptSpeaking";
pub const CMD_ENABLE_VOICE_INTERRUPT: &str = "enableVoiceInterrupt";
pub const CMD_SWITCH_ROBOT_VOICE: &str = "switchRobotVoice";
pub const CMD_MUTE_LOCAL_CAMERA: &str = "muteLocalCamera";
pub const CMD_IS_LOCAL_CAMERA_MUTE: &str = "isLocalCameraMute";
pub const CMD_SWITCH_CAMERA: &str = "switchCamera";
pub const CMD_SET_AGENT_TYPE: &str = "setAgentType";

/// Every command name the bridge understands.
pub const COMMAND_NAMES: &[&str] = &[
    CMD_INIT_ENGINE,
    CMD_CALL,
    CMD_HANGUP,
    CMD_SWITCH_MICROPHONE,
    CMD_ENABLE_SPEAKER,
    CMD_INTERRUPT_SPEAKING,
    CMD_ENABLE_VOICE_INTERRUPT,
    CMD_SWITCH_ROBOT_VOICE,
    CMD_MUTE_LOCAL_CAMERA,
    CMD_IS_LOCAL_CAMERA_MUTE,
    CMD_SWITCH_CAMERA,
    CMD_SET_AGENT_TYPE,
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitEngineArgs {
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SwitchMicrophoneArgs {
    pub on: bool,
}

/// Arguments for the `enable*` toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EnableArgs {
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRobotVoiceArgs {
    pub voice_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MuteLocalCameraArgs {
    pub mute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAgentTypeArgs {
    pub agent_type: AgentType,
}

/// A validated host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InitEngine(InitEngineArgs),
    Call(CallParameters),
    Hangup,
    SwitchMicrophone(SwitchMicrophoneArgs),
    EnableSpeaker(EnableArgs),
    InterruptSpeaking,
    EnableVoiceInterrupt(EnableArgs),
    SwitchRobotVoice(SwitchRobotVoiceArgs),
    MuteLocalCamera(MuteLocalCameraArgs),
    IsLocalCameraMute,
    SwitchCamera,
    SetAgentType(SetAgentTypeArgs),
}

impl Command {
    /// Parses a command from its name and argument map.
    ///
    /// Unknown names fail with `NotImplemented`; missing, mistyped or empty
    /// arguments fail with `InvalidArgument`.
    pub fn parse(name: &str, args: &Value) -> Result<Self> {
        let cmd = match name {
            CMD_INIT_ENGINE => {
                let args: InitEngineArgs = parse_args(name, args)?;
                require_non_empty(name, "userId", &args.user_id)?;
                Command::InitEngine(args)
            }
            CMD_CALL => {
                let params: CallParameters = parse_args(name, args)?;
                require_non_empty(name, "rtcToken", &params.rtc_token)?;
                require_non_empty(name, "agentInstanceId", &params.agent_instance_id)?;
                require_non_empty(name, "agentUserId", &params.agent_user_id)?;
                require_non_empty(name, "channelId", &params.channel_id)?;
                Command::Call(params)
            }
            CMD_HANGUP => Command::Hangup,
            CMD_SWITCH_MICROPHONE => Command::SwitchMicrophone(parse_args(name, args)?),
            CMD_ENABLE_SPEAKER => Command::EnableSpeaker(parse_args(name, args)?),
            CMD_INTERRUPT_SPEAKING => Command::InterruptSpeaking,
            CMD_ENABLE_VOICE_INTERRUPT => Command::EnableVoiceInterrupt(parse_args(name, args)?),
            CMD_SWITCH_ROBOT_VOICE => {
                let args: SwitchRobotVoiceArgs = parse_args(name, args)?;
                require_non_empty(name, "voiceId", &args.voice_id)?;
                Command::SwitchRobotVoice(args)
            }
            CMD_MUTE_LOCAL_CAMERA => Command::MuteLocalCamera(parse_args(name, args)?),
            CMD_IS_LOCAL_CAMERA_MUTE => Command::IsLocalCameraMute,
            CMD_SWITCH_CAMERA => Command::SwitchCamera,
            CMD_SET_AGENT_TYPE => Command::SetAgentType(parse_args(name, args)?),
            _ => return Err(BridgeError::not_implemented(name)),
        };
        Ok(cmd)
    }

    /// Returns the wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::InitEngine(_) => CMD_INIT_ENGINE,
            Command::Call(_) => CMD_CALL,
            Command::Hangup => CMD_HANGUP,
            Command::SwitchMicrophone(_) => CMD_SWITCH_MICROPHONE,
            Command::EnableSpeaker(_) => CMD_ENABLE_SPEAKER,
            Command::InterruptSpeaking => CMD_INTERRUPT_SPEAKING,
            Command::EnableVoiceInterrupt(_) => CMD_ENABLE_VOICE_INTERRUPT,
            Command::SwitchRobotVoice(_) => CMD_SWITCH_ROBOT_VOICE,
            Command::MuteLocalCamera(_) => CMD_MUTE_LOCAL_CAMERA,
            Command::IsLocalCameraMute => CMD_IS_LOCAL_CAMERA_MUTE,
            Command::SwitchCamera => CMD_SWITCH_CAMERA,
            Command::SetAgentType(_) => CMD_SET_AGENT_TYPE,
        }
    }
}

fn parse_args<T: DeserializeOwned>(name: &str, args: &Value) -> Result<T> {
    serde_json::from_value(args.clone()).map_err(|e| {
        BridgeError::invalid_argument(format!("missing or invalid arguments for {}", name))
            .with_details(e.to_string())
    })
}

fn require_non_empty(name: &str, field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(BridgeError::invalid_argument(format!(
            "missing or invalid {} for {}",
            field, name
        )));
    }
    Ok(())
}

/// Successful command result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandValue {
    /// Serializes as `null`.
    None,
    Bool(bool),
}

impl CommandValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CommandValue::None => None,
            CommandValue::Bool(b) => Some(*b),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CommandValue::None => Value::Null,
            CommandValue::Bool(b) => Value::Bool(*b),
        }
    }
}
