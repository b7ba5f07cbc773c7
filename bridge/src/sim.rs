//! Simulated engine for tests and scripted sessions.
//!
//! A [`SimController`] observes and steers every engine created by its
//! [`SimEngineFactory`]: it records each operation, injects failures or
//! panics by operation name, and fires callbacks on behalf of the engine.
//!
//! ```rust
//! use aicall_bridge::sim::SimController;
//!
//! let sim = SimController::new();
//! sim.fail_on("hangup", "network unreachable");
//! assert!(sim.ops().is_empty());
//! ```

use crate::{
    AgentType, CallConfig, CallParameters, Engine, EngineCallback, EngineCallbacks, EngineError,
    EngineFactory,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Code carried by errors injected with [`SimController::fail_on`].
pub const SIM_FAILURE_CODE: i32 = -1;

/// An operation observed by the simulated engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOp {
    Configure,
    SetAgentType(AgentType),
    Call { channel_id: String },
    Hangup,
    SwitchMicrophone(bool),
    EnableSpeaker(bool),
    InterruptSpeaking,
    EnableVoiceInterrupt(bool),
    SwitchRobotVoice(String),
    MuteLocalCamera(bool),
    IsLocalCameraMute,
    SwitchCamera,
    Release,
}

impl EngineOp {
    /// Returns the name used for failure injection.
    pub fn name(&self) -> &'static str {
        match self {
            EngineOp::Configure => "configure",
            EngineOp::SetAgentType(_) => "set_agent_type",
            EngineOp::Call { .. } => "call",
            EngineOp::Hangup => "hangup",
            EngineOp::SwitchMicrophone(_) => "switch_microphone",
            EngineOp::EnableSpeaker(_) => "enable_speaker",
            EngineOp::InterruptSpeaking => "interrupt_speaking",
            EngineOp::EnableVoiceInterrupt(_) => "enable_voice_interrupt",
            EngineOp::SwitchRobotVoice(_) => "switch_robot_voice",
            EngineOp::MuteLocalCamera(_) => "mute_local_camera",
            EngineOp::IsLocalCameraMute => "is_local_camera_mute",
            EngineOp::SwitchCamera => "switch_camera",
            EngineOp::Release => "release",
        }
    }
}

#[derive(Debug, Clone)]
enum Failure {
    Error(String),
    Panic(String),
}

#[derive(Default)]
struct SimShared {
    ops: Vec<EngineOp>,
    failures: HashMap<String, Failure>,
    fail_create: Option<String>,
    auto_begin: bool,
    end_on_hangup: bool,
    callbacks: Option<EngineCallbacks>,
    engines_created: usize,
    last_user_id: Option<String>,
    camera_muted: bool,
}

/// Handle for inspecting and steering simulated engines.
#[derive(Clone, Default)]
pub struct SimController {
    shared: Arc<Mutex<SimShared>>,
}

impl SimController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a factory whose engines report to this controller.
    pub fn factory(&self) -> SimEngineFactory {
        SimEngineFactory {
            shared: self.shared.clone(),
        }
    }

    /// Makes the named operation fail with an engine error.
    pub fn fail_on(&self, op: &str, message: &str) {
        self.shared
            .lock()
            .failures
            .insert(op.to_string(), Failure::Error(message.to_string()));
    }

    /// Makes the named operation panic.
    pub fn panic_on(&self, op: &str, message: &str) {
        self.shared
            .lock()
            .failures
            .insert(op.to_string(), Failure::Panic(message.to_string()));
    }

    /// Makes the next engine constructions fail.
    pub fn fail_create(&self, message: &str) {
        self.shared.lock().fail_create = Some(message.to_string());
    }

    pub fn clear_failures(&self) {
        let mut shared = self.shared.lock();
        shared.failures.clear();
        shared.fail_create = None;
    }

    /// Fires call begin right after an accepted join.
    pub fn set_auto_begin(&self, enabled: bool) {
        self.shared.lock().auto_begin = enabled;
    }

    /// Fires call end right after a successful hangup.
    pub fn set_end_on_hangup(&self, enabled: bool) {
        self.shared.lock().end_on_hangup = enabled;
    }

    /// Returns the callback handle of the most recently created engine.
    pub fn callbacks(&self) -> Option<EngineCallbacks> {
        self.shared.lock().callbacks.clone()
    }

    /// Fires a callback from the most recently created engine.
    pub fn fire(&self, callback: EngineCallback) -> bool {
        match self.callbacks() {
            Some(callbacks) => callbacks.emit(callback),
            None => false,
        }
    }

    pub fn ops(&self) -> Vec<EngineOp> {
        self.shared.lock().ops.clone()
    }

    pub fn count(&self, pred: impl Fn(&EngineOp) -> bool) -> usize {
        self.shared.lock().ops.iter().filter(|op| pred(op)).count()
    }

    pub fn engines_created(&self) -> usize {
        self.shared.lock().engines_created
    }

    pub fn last_user_id(&self) -> Option<String> {
        self.shared.lock().last_user_id.clone()
    }
}

/// Factory producing [`SimEngine`]s.
#[derive(Clone)]
pub struct SimEngineFactory {
    shared: Arc<Mutex<SimShared>>,
}

impl EngineFactory for SimEngineFactory {
    fn create(&self, user_id: &str, callbacks: EngineCallbacks) -> Result<Box<dyn Engine>, EngineError> {
        let mut shared = self.shared.lock();
        if let Some(message) = &shared.fail_create {
            return Err(EngineError::Construction(message.clone()));
        }
        shared.engines_created += 1;
        shared.last_user_id = Some(user_id.to_string());
        shared.camera_muted = false;
        shared.callbacks = Some(callbacks.clone());
        Ok(Box::new(SimEngine {
            shared: self.shared.clone(),
            callbacks,
            released: false,
        }))
    }
}

/// Simulated engine instance.
pub struct SimEngine {
    shared: Arc<Mutex<SimShared>>,
    callbacks: EngineCallbacks,
    released: bool,
}

impl SimEngine {
    /// Records an operation and applies any injected failure.
    fn record(&self, op: EngineOp) -> Result<(), EngineError> {
        if self.released {
            return Err(EngineError::Released);
        }
        let failure = {
            let mut shared = self.shared.lock();
            let failure = shared.failures.get(op.name()).cloned();
            shared.ops.push(op);
            failure
        };
        match failure {
            None => Ok(()),
            Some(Failure::Error(message)) => Err(EngineError::Rejected {
                code: SIM_FAILURE_CODE,
                message,
            }),
            Some(Failure::Panic(message)) => panic!("{}", message),
        }
    }
}

impl Engine for SimEngine {
    fn configure(&mut self, _config: &CallConfig) -> Result<(), EngineError> {
        self.record(EngineOp::Configure)
    }

    fn set_agent_type(&mut self, agent_type: AgentType) -> Result<(), EngineError> {
        self.record(EngineOp::SetAgentType(agent_type))
    }

    fn call(&mut self, params: &CallParameters) -> Result<(), EngineError> {
        self.record(EngineOp::Call {
            channel_id: params.channel_id.clone(),
        })?;
        if self.shared.lock().auto_begin {
            self.callbacks.on_call_begin();
        }
        Ok(())
    }

    fn hangup(&mut self) -> Result<(), EngineError> {
        self.record(EngineOp::Hangup)?;
        if self.shared.lock().end_on_hangup {
            self.callbacks.on_call_end();
        }
        Ok(())
    }

    fn switch_microphone(&mut self, on: bool) -> Result<(), EngineError> {
        self.record(EngineOp::SwitchMicrophone(on))
    }

    fn enable_speaker(&mut self, enable: bool) -> Result<bool, EngineError> {
        self.record(EngineOp::EnableSpeaker(enable))?;
        Ok(true)
    }

    fn interrupt_speaking(&mut self) -> Result<bool, EngineError> {
        self.record(EngineOp::InterruptSpeaking)?;
        Ok(true)
    }

    fn enable_voice_interrupt(&mut self, enable: bool) -> Result<bool, EngineError> {
        self.record(EngineOp::EnableVoiceInterrupt(enable))?;
        Ok(true)
    }

    fn switch_robot_voice(&mut self, voice_id: &str) -> Result<bool, EngineError> {
        self.record(EngineOp::SwitchRobotVoice(voice_id.to_string()))?;
        self.callbacks.on_voice_id_changed(voice_id);
        Ok(true)
    }

    fn mute_local_camera(&mut self, mute: bool) -> Result<bool, EngineError> {
        self.record(EngineOp::MuteLocalCamera(mute))?;
        self.shared.lock().camera_muted = mute;
        Ok(true)
    }

    fn is_local_camera_mute(&self) -> Result<bool, EngineError> {
        self.record(EngineOp::IsLocalCameraMute)?;
        Ok(self.shared.lock().camera_muted)
    }

    fn switch_camera(&mut self) -> Result<bool, EngineError> {
        self.record(EngineOp::SwitchCamera)?;
        Ok(true)
    }

    fn release(&mut self) -> Result<(), EngineError> {
        self.record(EngineOp::Release)?;
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod sim_tests {
    use super::*;

    fn create(sim: &SimController) -> (Box<dyn Engine>, tokio::sync::mpsc::UnboundedReceiver<EngineCallback>) {
        let (callbacks, rx) = EngineCallbacks::channel();
        let engine = sim.factory().create("u1", callbacks).unwrap();
        (engine, rx)
    }

    #[test]
    fn test_records_ops() {
        let sim = SimController::new();
        let (mut engine, _rx) = create(&sim);
        engine.switch_microphone(false).unwrap();
        engine.mute_local_camera(true).unwrap();
        assert!(engine.is_local_camera_mute().unwrap());
        assert_eq!(
            sim.ops(),
            vec![
                EngineOp::SwitchMicrophone(false),
                EngineOp::MuteLocalCamera(true),
                EngineOp::IsLocalCameraMute,
            ]
        );
        assert_eq!(sim.engines_created(), 1);
        assert_eq!(sim.last_user_id().as_deref(), Some("u1"));
    }

    #[test]
    fn test_injected_failure() {
        let sim = SimController::new();
        let (mut engine, _rx) = create(&sim);
        sim.fail_on("hangup", "not in channel");
        assert_eq!(
            engine.hangup().unwrap_err(),
            EngineError::Rejected {
                code: SIM_FAILURE_CODE,
                message: "not in channel".to_string(),
            }
        );
        assert_eq!(sim.count(|op| *op == EngineOp::Hangup), 1);
    }

    #[test]
    fn test_fail_create() {
        let sim = SimController::new();
        sim.fail_create("license expired");
        let (callbacks, _rx) = EngineCallbacks::channel();
        assert!(sim.factory().create("u1", callbacks).is_err());
        assert_eq!(sim.engines_created(), 0);
    }

    #[tokio::test]
    async fn test_auto_begin_and_end_on_hangup() {
        let sim = SimController::new();
        sim.set_auto_begin(true);
        sim.set_end_on_hangup(true);
        let (mut engine, mut rx) = create(&sim);
        let params = CallParameters {
            rtc_token: "t".to_string(),
            agent_instance_id: "a1".to_string(),
            agent_user_id: "au1".to_string(),
            channel_id: "c1".to_string(),
        };
        engine.call(&params).unwrap();
        engine.hangup().unwrap();
        assert_eq!(rx.recv().await, Some(EngineCallback::CallBegin));
        assert_eq!(rx.recv().await, Some(EngineCallback::CallEnd));
    }

    #[test]
    fn test_released_engine_rejects_ops() {
        let sim = SimController::new();
        let (mut engine, _rx) = create(&sim);
        engine.release().unwrap();
        assert_eq!(engine.switch_camera().unwrap_err(), EngineError::Released);
    }

    #[tokio::test]
    async fn test_fire() {
        let sim = SimController::new();
        assert!(!sim.fire(EngineCallback::CallBegin));
        let (_engine, mut rx) = create(&sim);
        assert!(sim.fire(EngineCallback::UserOnline { uid: "au1".to_string() }));
        assert_eq!(
            rx.recv().await,
            Some(EngineCallback::UserOnline { uid: "au1".to_string() })
        );
    }
}
