//! Session data owned by the state machine

use serde::{Deserialize, Serialize};

use shared::{ArtifactHandle, FeedbackSignals, QualityLevel, SessionId, SessionState, Transition, session_debug};

/// One evolution arc from a seed prompt to an archived artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub state: SessionState,
    /// Accepted feedback merges so far
    pub round_index: u32,
    pub max_rounds: Option<u32>,
    pub current_prompt: Option<String>,
    pub current_artifact: Option<ArtifactHandle>,
    pub quality_level: QualityLevel,
    /// Tallies for the current artifact; cleared whenever a new one is posted
    pub feedback_signals: FeedbackSignals,
    pub transitions: Vec<Transition>,
}

impl Session {
    pub fn new(max_rounds: Option<u32>, quality_level: QualityLevel) -> Self {
        Self {
            id: SessionId::new(),
            state: SessionState::Idle,
            round_index: 0,
            max_rounds,
            current_prompt: None,
            current_artifact: None,
            quality_level,
            feedback_signals: FeedbackSignals::new(),
            transitions: Vec::new(),
        }
    }

    /// Move to `to` and append the change to the transition log
    pub fn transition(&mut self, to: SessionState, cause: impl Into<String>) {
        let cause = cause.into();
        session_debug!(self.id, "🔀 {} -> {} ({})", self.state, to, cause);
        self.transitions.push(Transition {
            from: self.state,
            to,
            cause,
        });
        self.state = to;
    }

    /// Apply a tally change; removals saturate at zero
    pub fn record_feedback(&mut self, name: &str, delta: i64) {
        let weight = self.feedback_signals.entry(name.to_string()).or_insert(0);
        *weight = if delta >= 0 {
            weight.saturating_add(delta.unsigned_abs())
        } else {
            weight.saturating_sub(delta.unsigned_abs())
        };
    }

    pub fn reset_feedback(&mut self) {
        self.feedback_signals.clear();
    }

    pub fn rounds_exhausted(&self) -> bool {
        self.max_rounds.is_some_and(|max| self.round_index >= max)
    }

    /// States visited so far, starting with the initial one
    pub fn state_history(&self) -> Vec<SessionState> {
        let mut history = vec![self.transitions.first().map(|t| t.from).unwrap_or(self.state)];
        history.extend(self.transitions.iter().map(|t| t.to));
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(max_rounds: Option<u32>) -> Session {
        Session::new(max_rounds, QualityLevel::new(0, "low"))
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = session(Some(3));
        assert_eq!(session.state, SessionState::Idle);
        assert_eq!(session.round_index, 0);
        assert!(session.transitions.is_empty());
        assert_eq!(session.state_history(), vec![SessionState::Idle]);
    }

    #[test]
    fn test_transitions_are_logged_in_order() {
        let mut session = session(None);
        session.transition(SessionState::Generating, "tick");
        session.transition(SessionState::AwaitingFeedback, "generated");

        assert_eq!(session.state, SessionState::AwaitingFeedback);
        assert_eq!(session.transitions[0].cause, "tick");
        assert_eq!(
            session.state_history(),
            vec![SessionState::Idle, SessionState::Generating, SessionState::AwaitingFeedback]
        );
    }

    #[test]
    fn test_negative_feedback_saturates_at_zero() {
        let mut session = session(None);
        session.record_feedback("🔥", 2);
        session.record_feedback("🔥", -5);
        session.record_feedback("🌊", -1);
        assert_eq!(session.feedback_signals.get("🔥"), Some(&0));
        assert_eq!(session.feedback_signals.get("🌊"), Some(&0));

        session.record_feedback("🔥", 3);
        assert_eq!(session.feedback_signals.get("🔥"), Some(&3));
    }

    #[test]
    fn test_round_limit() {
        let mut bounded = session(Some(1));
        assert!(!bounded.rounds_exhausted());
        bounded.round_index = 1;
        assert!(bounded.rounds_exhausted());

        let mut unbounded = session(None);
        unbounded.round_index = u32::MAX;
        assert!(!unbounded.rounds_exhausted());
    }
}
