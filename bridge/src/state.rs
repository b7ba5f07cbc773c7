//! Call lifecycle state machine.

use crate::{BridgeError, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallState {
    /// No engine exists.
    #[default]
    Uninitialized,
    Idle,
    /// A join was accepted, waiting for the engine to report call begin.
    Joining,
    InCall,
    /// Teardown in progress.
    Ending,
}

impl CallState {
    /// Returns true while a call is joining or established.
    pub fn is_active(&self) -> bool {
        matches!(self, CallState::Joining | CallState::InCall)
    }

    /// Returns true if an engine handle exists and accepts commands.
    pub fn is_ready(&self) -> bool {
        !matches!(self, CallState::Uninitialized | CallState::Ending)
    }

    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Uninitialized => "uninitialized",
            CallState::Idle => "idle",
            CallState::Joining => "joining",
            CallState::InCall => "in_call",
            CallState::Ending => "ending",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CallState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Call modality requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgentType {
    #[default]
    VoiceAgent,
    AvatarAgent,
    VisionAgent,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::VoiceAgent => "VoiceAgent",
            AgentType::AvatarAgent => "AvatarAgent",
            AgentType::VisionAgent => "VisionAgent",
        }
    }

    /// Parses an agent type name. Returns None for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VoiceAgent" => Some(AgentType::VoiceAgent),
            "AvatarAgent" => Some(AgentType::AvatarAgent),
            "VisionAgent" => Some(AgentType::VisionAgent),
            _ => None,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the most recent join attempt has resolved so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    Pending,
    Established,
    /// The join command failed synchronously.
    Rejected,
    /// Ended by hangup, call end or a fatal error.
    Ended,
}

/// Effect of an engine call begin on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallBegin {
    /// The session moved to InCall.
    Entered,
    /// No transition. The event is still delivered.
    Unchanged,
    /// Belongs to an attempt that already ended. Dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JoinAttempt {
    pub id: u64,
    pub outcome: AttemptOutcome,
}

/// Session bookkeeping. Every access happens under the bridge lock.
#[derive(Debug)]
pub(crate) struct Session {
    state: CallState,
    user_id: Option<String>,
    agent_type: AgentType,
    epoch: u64,
    attempts: u64,
    last_attempt: Option<JoinAttempt>,
}

impl Session {
    pub fn new(agent_type: AgentType) -> Self {
        Self {
            state: CallState::Uninitialized,
            user_id: None,
            agent_type,
            epoch: 0,
            attempts: 0,
            last_attempt: None,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[cfg(test)]
    pub fn last_attempt(&self) -> Option<JoinAttempt> {
        self.last_attempt
    }

    /// Binds the identity of a freshly constructed engine and returns its epoch.
    pub fn bind(&mut self, user_id: &str) -> u64 {
        self.epoch += 1;
        self.user_id = Some(user_id.to_string());
        self.state = CallState::Idle;
        self.last_attempt = None;
        self.epoch
    }

    /// Accepts a join request. Only legal from Idle.
    pub fn begin_join(&mut self) -> Result<u64> {
        if self.state != CallState::Idle {
            return Err(BridgeError::new(ErrorKind::Call, "already in a call or joining")
                .with_details("end the current call before starting a new one"));
        }
        self.attempts += 1;
        self.state = CallState::Joining;
        self.last_attempt = Some(JoinAttempt {
            id: self.attempts,
            outcome: AttemptOutcome::Pending,
        });
        Ok(self.attempts)
    }

    /// Reverts a join whose command failed synchronously.
    pub fn reject_join(&mut self, attempt_id: u64) {
        if let Some(attempt) = self.last_attempt.as_mut() {
            if attempt.id == attempt_id && attempt.outcome == AttemptOutcome::Pending {
                attempt.outcome = AttemptOutcome::Rejected;
                if self.state == CallState::Joining {
                    self.state = CallState::Idle;
                }
            }
        }
    }

    /// Applies an engine call begin.
    pub fn on_call_begin(&mut self) -> CallBegin {
        let late_after_rejection = self.state == CallState::Idle
            && matches!(
                self.last_attempt,
                Some(JoinAttempt { outcome: AttemptOutcome::Rejected, .. })
            );
        if self.state == CallState::Joining || late_after_rejection {
            self.state = CallState::InCall;
            if let Some(attempt) = self.last_attempt.as_mut() {
                attempt.outcome = AttemptOutcome::Established;
            }
            return CallBegin::Entered;
        }
        match self.last_attempt {
            Some(JoinAttempt { outcome: AttemptOutcome::Ended, .. }) => CallBegin::Stale,
            _ => CallBegin::Unchanged,
        }
    }

    /// Applies call termination from any source. Returns true if a call was active.
    pub fn end_call(&mut self) -> bool {
        if let Some(attempt) = self.last_attempt.as_mut() {
            attempt.outcome = AttemptOutcome::Ended;
        }
        if self.state.is_active() {
            self.state = CallState::Idle;
            return true;
        }
        false
    }

    /// Changes the agent type. Rejected while a join is in flight.
    pub fn set_agent_type(&mut self, agent_type: AgentType) -> Result<()> {
        if self.state == CallState::Joining {
            return Err(BridgeError::new(
                ErrorKind::AgentType,
                "cannot change agent type while joining",
            ));
        }
        self.agent_type = agent_type;
        Ok(())
    }

    /// Enters teardown and returns the state it left.
    pub fn begin_teardown(&mut self) -> CallState {
        let prev = self.state;
        self.state = CallState::Ending;
        prev
    }

    /// Completes teardown.
    pub fn unbind(&mut self) {
        self.state = CallState::Uninitialized;
        self.user_id = None;
        self.last_attempt = None;
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;

    fn bound() -> Session {
        let mut s = Session::new(AgentType::VoiceAgent);
        s.bind("u1");
        s
    }

    #[test]
    fn test_call_state_string() {
        assert_eq!(CallState::Uninitialized.to_string(), "uninitialized");
        assert_eq!(CallState::InCall.to_string(), "in_call");
        assert_eq!(serde_json::to_string(&CallState::Joining).unwrap(), r#""joining""#);
    }

    #[test]
    fn test_call_state_predicates() {
        assert!(CallState::Joining.is_active());
        assert!(CallState::InCall.is_active());
        assert!(!CallState::Idle.is_active());
        assert!(CallState::Idle.is_ready());
        assert!(!CallState::Uninitialized.is_ready());
        assert!(!CallState::Ending.is_ready());
    }

    #[test]
    fn test_agent_type_parse() {
        assert_eq!(AgentType::parse("AvatarAgent"), Some(AgentType::AvatarAgent));
        assert_eq!(AgentType::parse("avatar"), None);
        let json = serde_json::to_string(&AgentType::VisionAgent).unwrap();
        assert_eq!(json, r#""VisionAgent""#);
    }

    #[test]
    fn test_bind_increments_epoch() {
        let mut s = Session::new(AgentType::VoiceAgent);
        assert_eq!(s.bind("u1"), 1);
        assert_eq!(s.state(), CallState::Idle);
        assert_eq!(s.user_id(), Some("u1"));
        s.unbind();
        assert_eq!(s.state(), CallState::Uninitialized);
        assert_eq!(s.bind("u2"), 2);
    }

    #[test]
    fn test_join_guard() {
        let mut s = bound();
        s.begin_join().unwrap();
        assert_eq!(s.state(), CallState::Joining);

        let err = s.begin_join().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Call);
        assert_eq!(s.state(), CallState::Joining);

        assert_eq!(s.on_call_begin(), CallBegin::Entered);
        let err = s.begin_join().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Call);
        assert_eq!(s.state(), CallState::InCall);
    }

    #[test]
    fn test_reject_join_reverts_to_idle() {
        let mut s = bound();
        let id = s.begin_join().unwrap();
        s.reject_join(id);
        assert_eq!(s.state(), CallState::Idle);
        assert_eq!(s.last_attempt().unwrap().outcome, AttemptOutcome::Rejected);
    }

    #[test]
    fn test_late_call_begin_after_rejection_is_honored() {
        let mut s = bound();
        let id = s.begin_join().unwrap();
        s.reject_join(id);
        assert_eq!(s.on_call_begin(), CallBegin::Entered);
        assert_eq!(s.state(), CallState::InCall);
    }

    #[test]
    fn test_call_begin_after_hangup_is_stale() {
        let mut s = bound();
        s.begin_join().unwrap();
        assert!(s.end_call());
        assert_eq!(s.on_call_begin(), CallBegin::Stale);
        assert_eq!(s.state(), CallState::Idle);
    }

    #[test]
    fn test_duplicate_call_begin_keeps_state() {
        let mut s = bound();
        s.begin_join().unwrap();
        assert_eq!(s.on_call_begin(), CallBegin::Entered);
        assert_eq!(s.on_call_begin(), CallBegin::Unchanged);
        assert_eq!(s.state(), CallState::InCall);
    }

    #[test]
    fn test_call_begin_without_join_keeps_idle() {
        let mut s = bound();
        assert_eq!(s.on_call_begin(), CallBegin::Unchanged);
        assert_eq!(s.state(), CallState::Idle);
    }

    #[test]
    fn test_end_call_when_idle() {
        let mut s = bound();
        assert!(!s.end_call());
        assert_eq!(s.state(), CallState::Idle);
    }

    #[test]
    fn test_agent_type_rejected_while_joining() {
        let mut s = bound();
        s.set_agent_type(AgentType::AvatarAgent).unwrap();
        s.begin_join().unwrap();
        let err = s.set_agent_type(AgentType::VisionAgent).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AgentType);
        assert_eq!(s.agent_type(), AgentType::AvatarAgent);

        assert_eq!(s.on_call_begin(), CallBegin::Entered);
        s.set_agent_type(AgentType::VisionAgent).unwrap();
        assert_eq!(s.agent_type(), AgentType::VisionAgent);
    }

    #[test]
    fn test_teardown() {
        let mut s = bound();
        s.begin_join().unwrap();
        assert_eq!(s.begin_teardown(), CallState::Joining);
        assert_eq!(s.state(), CallState::Ending);
        s.unbind();
        assert_eq!(s.state(), CallState::Uninitialized);
        assert_eq!(s.user_id(), None);
    }
}
