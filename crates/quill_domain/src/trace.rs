use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Names recorded in the audit trail for each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AgentName {
    Planner,
    Research,
    Writer,
    MultiOutputWriter,
    Verifier,
}

/// An audit record of something a stage did.
#[derive(Debug, Clone, PartialEq, Setters, Serialize, Deserialize)]
#[setters(strip_option, into)]
pub struct TraceEvent {
    #[setters(skip)]
    pub agent: AgentName,
    #[setters(skip)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl TraceEvent {
    pub fn new(agent: AgentName, action: impl Into<String>) -> Self {
        Self { agent, action: action.into(), input: None, output: None }
    }
}

/// Append-only log of [`TraceEvent`]s in execution order.
///
/// Only `push` mutates the trace; existing events are never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentTrace(Vec<TraceEvent>);

impl AgentTrace {
    pub fn push(&mut self, event: TraceEvent) {
        self.0.push(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceEvent> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&TraceEvent> {
        self.0.last()
    }
}

impl<'a> IntoIterator for &'a AgentTrace {
    type Item = &'a TraceEvent;
    type IntoIter = std::slice::Iter<'a, TraceEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
