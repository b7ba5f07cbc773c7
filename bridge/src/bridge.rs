//! The call session bridge.

use crate::adapter::EngineAdapter;
use crate::logger::{default_logger, Logger};
use crate::state::{CallBegin, Session};
use crate::{
    log_debug, log_info, log_warn, AgentType, BridgeConfig, BridgeError, BridgeEvent, CallState,
    Command, CommandValue, EngineCallback, EngineCallbacks, EngineFactory, ErrorKind, EventSink,
    Result,
};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Session state and the engine handle, guarded together.
struct Inner {
    session: Session,
    adapter: Option<EngineAdapter>,
}

/// State shared between the bridge and its callback pump.
struct Shared {
    inner: Mutex<Inner>,
    sink: Arc<dyn EventSink>,
    config: BridgeConfig,
    logger: Arc<dyn Logger>,
    seq: AtomicU64,
    emit_lock: Mutex<()>,
    /// Stops the pump of the current engine. Reachable without the session lock.
    pump_cancel: parking_lot::Mutex<Option<CancellationToken>>,
}

impl Shared {
    fn cancel_pump(&self) {
        if let Some(cancel) = self.pump_cancel.lock().take() {
            cancel.cancel();
        }
    }
}

/// Bridges host commands to an engine and engine callbacks to host events.
///
/// One bridge owns at most one engine at a time. Commands are serialized by
/// an internal lock; engine callbacks are drained by a background task that
/// updates the session before forwarding each event to the [`EventSink`].
///
/// Must be used inside a tokio runtime. Dropping the bridge tears the engine
/// down if no command is in flight; call [`Bridge::detach`] for a guaranteed
/// teardown.
pub struct Bridge {
    shared: Arc<Shared>,
    factory: Arc<dyn EngineFactory>,
}

/// Builder for [`Bridge`].
pub struct BridgeBuilder {
    factory: Arc<dyn EngineFactory>,
    sink: Arc<dyn EventSink>,
    config: BridgeConfig,
    logger: Option<Arc<dyn Logger>>,
}

impl BridgeBuilder {
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Bridge {
        let session = Session::new(self.config.agent_type);
        Bridge {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session,
                    adapter: None,
                }),
                sink: self.sink,
                config: self.config,
                logger: self.logger.unwrap_or_else(default_logger),
                seq: AtomicU64::new(0),
                emit_lock: Mutex::new(()),
                pump_cancel: parking_lot::Mutex::new(None),
            }),
            factory: self.factory,
        }
    }
}

impl Bridge {
    /// Creates a bridge with the default configuration.
    pub fn new(factory: Arc<dyn EngineFactory>, sink: Arc<dyn EventSink>) -> Self {
        Self::builder(factory, sink).build()
    }

    pub fn builder(factory: Arc<dyn EngineFactory>, sink: Arc<dyn EventSink>) -> BridgeBuilder {
        BridgeBuilder {
            factory,
            sink,
            config: BridgeConfig::default(),
            logger: None,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    pub async fn state(&self) -> CallState {
        self.shared.inner.lock().await.session.state()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.shared.inner.lock().await.session.user_id().map(str::to_string)
    }

    pub async fn agent_type(&self) -> AgentType {
        self.shared.inner.lock().await.session.agent_type()
    }

    /// Dispatches a host command by name.
    ///
    /// Unknown names and malformed arguments are rejected before the session
    /// is touched.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<CommandValue> {
        let command = match Command::parse(name, args) {
            Ok(command) => command,
            Err(e) => {
                log_warn!(self.shared.logger, "{} rejected: {}", name, e);
                return Err(e);
            }
        };
        self.execute(command).await
    }

    /// Executes a parsed command against the session.
    pub async fn execute(&self, command: Command) -> Result<CommandValue> {
        let name = command.name();
        let result = self.run(command).await;
        match &result {
            Ok(value) => log_debug!(self.shared.logger, "{} -> {:?}", name, value),
            Err(e) => log_warn!(self.shared.logger, "{} failed: {}", name, e),
        }
        result
    }

    async fn run(&self, command: Command) -> Result<CommandValue> {
        let mut guard = self.shared.inner.lock().await;
        let inner = &mut *guard;

        match command {
            Command::InitEngine(args) => self.init_engine(inner, &args.user_id),
            Command::Call(params) => {
                let (session, adapter) = ready(inner)?;
                let attempt = session.begin_join()?;
                log_info!(
                    self.shared.logger,
                    "joining channel={} agent={} type={}",
                    params.channel_id,
                    params.agent_instance_id,
                    session.agent_type()
                );
                if let Err(e) =
                    adapter.start_call(&self.shared.config.call, session.agent_type(), &params)
                {
                    session.reject_join(attempt);
                    return Err(e);
                }
                Ok(CommandValue::None)
            }
            Command::Hangup => {
                let (session, adapter) = ready(inner)?;
                let result = adapter.hangup();
                session.end_call();
                result.map(|_| CommandValue::None)
            }
            Command::SwitchMicrophone(args) => {
                ready(inner)?.1.switch_microphone(args.on)?;
                Ok(CommandValue::None)
            }
            Command::EnableSpeaker(args) => ready(inner)?
                .1
                .enable_speaker(args.enable)
                .map(CommandValue::Bool),
            Command::InterruptSpeaking => ready(inner)?.1.interrupt_speaking().map(CommandValue::Bool),
            Command::EnableVoiceInterrupt(args) => ready(inner)?
                .1
                .enable_voice_interrupt(args.enable)
                .map(CommandValue::Bool),
            Command::SwitchRobotVoice(args) => ready(inner)?
                .1
                .switch_robot_voice(&args.voice_id)
                .map(CommandValue::Bool),
            Command::MuteLocalCamera(args) => ready(inner)?
                .1
                .mute_local_camera(args.mute)
                .map(CommandValue::Bool),
            Command::IsLocalCameraMute => ready(inner)?.1.is_local_camera_mute().map(CommandValue::Bool),
            Command::SwitchCamera => ready(inner)?.1.switch_camera().map(CommandValue::Bool),
            Command::SetAgentType(args) => {
                let (session, adapter) = ready(inner)?;
                match session.state() {
                    CallState::Joining => {
                        return Err(BridgeError::new(
                            ErrorKind::AgentType,
                            "cannot change agent type while joining",
                        ));
                    }
                    CallState::InCall => adapter.set_agent_type(args.agent_type)?,
                    _ => {}
                }
                session.set_agent_type(args.agent_type)?;
                Ok(CommandValue::None)
            }
        }
    }

    fn init_engine(&self, inner: &mut Inner, user_id: &str) -> Result<CommandValue> {
        if inner.session.state() != CallState::Uninitialized {
            return Err(BridgeError::new(ErrorKind::Init, "engine already initialized")
                .with_details("detach before initializing again"));
        }

        let (callbacks, rx) = EngineCallbacks::channel();
        let adapter = EngineAdapter::create(
            &*self.factory,
            user_id,
            callbacks,
            self.shared.logger.clone(),
        )?;
        let epoch = inner.session.bind(user_id);
        inner.adapter = Some(adapter);

        let cancel = CancellationToken::new();
        *self.shared.pump_cancel.lock() = Some(cancel.clone());
        tokio::spawn(pump(self.shared.clone(), epoch, rx, cancel));

        log_info!(self.shared.logger, "engine initialized user={} epoch={}", user_id, epoch);
        Ok(CommandValue::None)
    }

    /// Tears the session down: hangs up an active call once, releases the
    /// engine and returns to `Uninitialized`. Never fails.
    pub async fn detach(&self) {
        let mut inner = self.shared.inner.lock().await;
        teardown(&mut inner, &self.shared);
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        match self.shared.inner.try_lock() {
            Ok(mut inner) => teardown(&mut inner, &self.shared),
            Err(_) => {
                self.shared.cancel_pump();
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        log_warn!(self.shared.logger, "bridge dropped while busy, deferring teardown");
                        let shared = self.shared.clone();
                        handle.spawn(async move {
                            let mut inner = shared.inner.lock().await;
                            teardown(&mut inner, &shared);
                        });
                    }
                    Err(_) => log_warn!(
                        self.shared.logger,
                        "bridge dropped while busy outside a runtime, skipping teardown"
                    ),
                }
            }
        }
    }
}

/// Returns the session and engine, or `NotInitialized` if there is no engine.
fn ready(inner: &mut Inner) -> Result<(&mut Session, &mut EngineAdapter)> {
    let Inner {
        session, adapter, ..
    } = inner;
    match adapter.as_mut() {
        Some(adapter) if session.state().is_ready() => Ok((session, adapter)),
        _ => Err(BridgeError::not_initialized()),
    }
}

fn teardown(inner: &mut Inner, shared: &Shared) {
    let logger = &*shared.logger;
    shared.cancel_pump();
    let Some(mut adapter) = inner.adapter.take() else {
        return;
    };

    let prev = inner.session.begin_teardown();
    if prev.is_active() {
        if let Err(e) = adapter.hangup() {
            log_warn!(logger, "detach: hangup failed: {}", e);
        }
    }
    if let Err(e) = adapter.release() {
        log_warn!(logger, "detach: release failed: {}", e);
    }
    inner.session.unbind();
    log_info!(logger, "engine detached (was {})", prev);
}

/// Drains engine callbacks for one engine generation.
async fn pump(
    shared: Arc<Shared>,
    epoch: u64,
    mut rx: mpsc::UnboundedReceiver<EngineCallback>,
    cancel: CancellationToken,
) {
    loop {
        let callback = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            callback = rx.recv() => match callback {
                Some(callback) => callback,
                None => break,
            },
        };

        if !apply_callback(&shared, epoch, &callback).await {
            continue;
        }

        let _emit = shared.emit_lock.lock().await;
        if cancel.is_cancelled() {
            log_debug!(shared.logger, "dropping callback from detached engine: {:?}", callback);
            break;
        }
        let seq = shared.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let event = BridgeEvent::from_callback(seq, &callback);
        if let Err(e) = shared.sink.emit(&event).await {
            log_warn!(shared.logger, "failed to emit {}: {}", event.name, e);
        }
    }
    log_debug!(shared.logger, "callback pump stopped epoch={}", epoch);
}

/// Applies the state effect of a callback. Returns false if it must be dropped.
async fn apply_callback(shared: &Shared, epoch: u64, callback: &EngineCallback) -> bool {
    let mut inner = shared.inner.lock().await;
    let session = &mut inner.session;

    if session.epoch() != epoch || !session.state().is_ready() {
        log_debug!(shared.logger, "dropping callback from detached engine: {:?}", callback);
        return false;
    }

    match callback {
        EngineCallback::CallBegin => match session.on_call_begin() {
            CallBegin::Entered => {}
            CallBegin::Unchanged => {
                log_debug!(shared.logger, "call begin in state {}", session.state());
            }
            CallBegin::Stale => {
                log_debug!(
                    shared.logger,
                    "dropping stale call begin in state {}",
                    session.state()
                );
                return false;
            }
        },
        EngineCallback::CallEnd => {
            session.end_call();
        }
        EngineCallback::Error { code } if shared.config.is_fatal(*code) => {
            if session.end_call() {
                log_warn!(shared.logger, "engine error {} ended the call", code);
            }
        }
        _ => {}
    }
    true
}
