//! Inbound session triggers

use serde::{Deserialize, Serialize};

/// Everything that can wake a session's engine.
///
/// Ticks and presenter events are merged into one channel per session, so
/// a single consumer sees them in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Periodic round timer
    Tick,
    /// Begin or resume evolving, optionally seeding the next session with `prompt`
    Start { prompt: Option<String> },
    /// Pause: round ticks stop driving the session until the next `Start`
    Stop,
    /// A feedback tag changed weight on the current artifact; negative when a reaction is removed
    Feedback { name: String, delta: i64 },
    /// A reserved tag was used
    Meta { name: String },
    /// Retry publishing the last archived artifact
    Publish,
}

impl Trigger {
    pub fn start() -> Self {
        Trigger::Start { prompt: None }
    }

    /// Start with an explicit seed; a blank prompt means a random seed
    pub fn start_with(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let prompt = prompt.trim();
        Trigger::Start {
            prompt: (!prompt.is_empty()).then(|| prompt.to_string()),
        }
    }

    pub fn feedback(name: impl Into<String>, delta: i64) -> Self {
        Trigger::Feedback { name: name.into(), delta }
    }

    pub fn meta(name: impl Into<String>) -> Self {
        Trigger::Meta { name: name.into() }
    }

    /// Parse a console command line such as `feedback 🔥 2`, `meta 🏁`, `start a red fox` or `tick`
    pub fn parse_command(line: &str) -> Option<Self> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let mut parts = rest.split_whitespace();
        match command {
            "tick" => Some(Trigger::Tick),
            "start" => Some(Trigger::start_with(rest)),
            "stop" => Some(Trigger::Stop),
            "publish" => Some(Trigger::Publish),
            "meta" => parts.next().map(Trigger::meta),
            "feedback" => {
                let name = parts.next()?;
                let delta = match parts.next() {
                    Some(raw) => raw.parse().ok()?,
                    None => 1,
                };
                Some(Trigger::feedback(name, delta))
            }
            _ => None,
        }
    }

    /// Short label used in transition logs
    pub fn label(&self) -> String {
        match self {
            Trigger::Tick => "tick".to_string(),
            Trigger::Start { prompt: None } => "start".to_string(),
            Trigger::Start { prompt: Some(prompt) } => format!("start \"{prompt}\""),
            Trigger::Stop => "stop".to_string(),
            Trigger::Feedback { name, delta } => format!("feedback {name} {delta:+}"),
            Trigger::Meta { name } => format!("meta {name}"),
            Trigger::Publish => "publish".to_string(),
        }
    }
}
