//! Conversation history — the append-only turn log owned by each `Call`
//! (spec.md §3).

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User,
    Assistant,
    System,
    Dtmf,
    Tool,
}

/// The kind of content a turn carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnType {
    Message,
    FunctionCall,
    FunctionCallOutput,
}

/// One entry in a call's conversation history.
///
/// `agent_id` is populated only on `FunctionCall`/`FunctionCallOutput` turns
/// that originate from an agent handoff; per spec.md §9 it is modeled as a
/// plain identifier, never an object reference, to keep handoffs acyclic
/// data rather than an object graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub actor: Actor,
    #[serde(rename = "type")]
    pub turn_type: TurnType,
    pub content: String,
    pub timestamp_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl ConversationTurn {
    #[must_use]
    pub fn message(actor: Actor, content: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            actor,
            turn_type: TurnType::Message,
            content: content.into(),
            timestamp_ms,
            agent_id: None,
        }
    }
}

/// Append-only conversation log for one call.
///
/// Discarded on cleanup unless a snapshot was requested before cleanup
/// completed (I-invariant, spec.md §3): `snapshot` clones the current turns,
/// it does not move them, so cleanup can still drop the original.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_is_ordered() {
        let mut history = ConversationHistory::new();
        history.append(ConversationTurn::message(Actor::User, "hi", 1));
        history.append(ConversationTurn::message(Actor::Assistant, "hello", 2));

        let snap = history.snapshot();
        assert_eq!(snap[0].content, "hi");
        assert_eq!(snap[1].content, "hello");
    }

    #[test]
    fn snapshot_does_not_drain() {
        let mut history = ConversationHistory::new();
        history.append(ConversationTurn::message(Actor::User, "hi", 1));
        let _ = history.snapshot();
        assert_eq!(history.len(), 1);
    }
}
