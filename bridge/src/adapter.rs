//! Engine adapter: the only code that calls into the engine.
//!
//! Each operation is total. Engine errors and panics come back as a
//! [`BridgeError`] of the command's kind, and are logged here.

use crate::logger::Logger;
use crate::{
    log_error, AgentType, BridgeError, CallConfig, CallParameters, Engine, EngineCallbacks,
    EngineError, EngineFactory, ErrorKind, Result,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub(crate) struct EngineAdapter {
    engine: Box<dyn Engine>,
    logger: Arc<dyn Logger>,
}

impl EngineAdapter {
    /// Constructs an engine through the factory.
    pub fn create(
        factory: &dyn EngineFactory,
        user_id: &str,
        callbacks: EngineCallbacks,
        logger: Arc<dyn Logger>,
    ) -> Result<Self> {
        let engine = guard(&*logger, ErrorKind::Init, "failed to initialize engine", || {
            factory.create(user_id, callbacks)
        })?;
        Ok(Self { engine, logger })
    }

    /// Applies call configuration and agent type, then requests the join.
    pub fn start_call(
        &mut self,
        config: &CallConfig,
        agent_type: AgentType,
        params: &CallParameters,
    ) -> Result<()> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::Call, "failed to start call", || {
            engine.configure(config)?;
            engine.set_agent_type(agent_type)?;
            engine.call(params)
        })
    }

    pub fn hangup(&mut self) -> Result<()> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::Hangup, "failed to hang up", || engine.hangup())
    }

    pub fn set_agent_type(&mut self, agent_type: AgentType) -> Result<()> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::AgentType, "failed to set agent type", || {
            engine.set_agent_type(agent_type)
        })
    }

    pub fn switch_microphone(&mut self, on: bool) -> Result<()> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::Mic, "failed to switch microphone", || {
            engine.switch_microphone(on)
        })
    }

    pub fn enable_speaker(&mut self, enable: bool) -> Result<bool> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::Speaker, "failed to switch speaker", || {
            engine.enable_speaker(enable)
        })
    }

    pub fn interrupt_speaking(&mut self) -> Result<bool> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::Interrupt, "failed to interrupt speaking", || {
            engine.interrupt_speaking()
        })
    }

    pub fn enable_voice_interrupt(&mut self, enable: bool) -> Result<bool> {
        let engine = &mut self.engine;
        guard(
            &*self.logger,
            ErrorKind::VoiceInterrupt,
            "failed to enable voice interrupt",
            || engine.enable_voice_interrupt(enable),
        )
    }

    pub fn switch_robot_voice(&mut self, voice_id: &str) -> Result<bool> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::VoiceSwitch, "failed to switch robot voice", || {
            engine.switch_robot_voice(voice_id)
        })
    }

    pub fn mute_local_camera(&mut self, mute: bool) -> Result<bool> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::Camera, "failed to mute local camera", || {
            engine.mute_local_camera(mute)
        })
    }

    pub fn is_local_camera_mute(&self) -> Result<bool> {
        let engine = &self.engine;
        guard(&*self.logger, ErrorKind::Camera, "failed to get camera mute state", || {
            engine.is_local_camera_mute()
        })
    }

    pub fn switch_camera(&mut self) -> Result<bool> {
        let engine = &mut self.engine;
        guard(&*self.logger, ErrorKind::Camera, "failed to switch camera", || {
            engine.switch_camera()
        })
    }

    /// Releases the engine. Failures are logged by the caller and not retried.
    pub fn release(mut self) -> std::result::Result<(), EngineError> {
        let engine = &mut self.engine;
        match panic::catch_unwind(AssertUnwindSafe(|| engine.release())) {
            Ok(result) => result,
            Err(payload) => Err(EngineError::Panicked(panic_message(payload))),
        }
    }
}

/// Runs an engine operation, converting errors and panics into `kind`.
fn guard<T>(
    logger: &dyn Logger,
    kind: ErrorKind,
    message: &str,
    op: impl FnOnce() -> std::result::Result<T, EngineError>,
) -> Result<T> {
    let err = match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(e)) => e,
        Err(payload) => EngineError::Panicked(panic_message(payload)),
    };
    log_error!(logger, "{}: {}", message, err);
    Err(BridgeError::from_engine(kind, message, &err))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod adapter_tests {
    use super::*;
    use crate::logger::tests::CapturingLogger;
    use crate::sim::{EngineOp, SimController};

    fn adapter(sim: &SimController, logger: Arc<CapturingLogger>) -> EngineAdapter {
        let factory = sim.factory();
        let (callbacks, _rx) = EngineCallbacks::channel();
        EngineAdapter::create(&factory, "u1", callbacks, logger).unwrap()
    }

    fn params() -> CallParameters {
        CallParameters {
            rtc_token: "token".to_string(),
            agent_instance_id: "a1".to_string(),
            agent_user_id: "au1".to_string(),
            channel_id: "c1".to_string(),
        }
    }

    #[test]
    fn test_start_call_order() {
        let sim = SimController::new();
        let mut adapter = adapter(&sim, Arc::new(CapturingLogger::default()));
        adapter
            .start_call(&CallConfig::default(), AgentType::AvatarAgent, &params())
            .unwrap();
        assert_eq!(
            sim.ops(),
            vec![
                EngineOp::Configure,
                EngineOp::SetAgentType(AgentType::AvatarAgent),
                EngineOp::Call {
                    channel_id: "c1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_engine_error_mapped_to_kind() {
        let sim = SimController::new();
        let logger = Arc::new(CapturingLogger::default());
        let mut adapter = adapter(&sim, logger.clone());
        sim.fail_on("enable_speaker", "audio route busy");

        let err = adapter.enable_speaker(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Speaker);
        assert_eq!(err.message, "failed to switch speaker");
        assert!(err.details.unwrap().contains("audio route busy"));
        assert!(logger.contains("error", "failed to switch speaker"));
    }

    #[test]
    fn test_engine_panic_mapped_to_kind() {
        let sim = SimController::new();
        let mut adapter = adapter(&sim, Arc::new(CapturingLogger::default()));
        sim.panic_on("switch_camera", "native crash");

        let err = adapter.switch_camera().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Camera);
        assert!(err.details.unwrap().contains("native crash"));

        sim.clear_failures();
        assert!(adapter.switch_camera().unwrap());
    }

    #[test]
    fn test_create_failure_is_init_error() {
        let sim = SimController::new();
        sim.fail_create("no audio device");
        let factory = sim.factory();
        let (callbacks, _rx) = EngineCallbacks::channel();
        let err = EngineAdapter::create(&factory, "u1", callbacks, Arc::new(CapturingLogger::default()))
            .err()
            .unwrap();
        assert_eq!(err.kind, ErrorKind::Init);
        assert!(err.details.unwrap().contains("no audio device"));
    }

    #[test]
    fn test_release_reports_failure() {
        let sim = SimController::new();
        let adapter = adapter(&sim, Arc::new(CapturingLogger::default()));
        sim.fail_on("release", "already freed");
        assert!(adapter.release().is_err());
        assert_eq!(sim.count(|op| *op == EngineOp::Release), 1);
    }
}
