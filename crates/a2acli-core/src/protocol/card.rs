use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::task::{Message, Part, Role, TaskId};

/// Self-description published by a remote agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub supported_interfaces: Vec<AgentInterface>,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Protocol bindings the agent advertises, deduplicated, in card order.
    pub fn advertised_bindings(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for iface in &self.supported_interfaces {
            let b = iface.protocol_binding.as_str();
            if !b.is_empty() && !seen.contains(&b) {
                seen.push(b);
            }
        }
        seen
    }
}

/// One endpoint of the agent and the binding it speaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInterface {
    #[serde(default)]
    pub url: String,
    pub protocol_binding: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Each entry maps a security scheme name to its required scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_requirements: Vec<BTreeMap<String, Vec<String>>>,
}

impl AgentSkill {
    pub fn security_schemes(&self) -> Vec<&str> {
        self.security_requirements
            .iter()
            .flat_map(|req| req.keys().map(String::as_str))
            .collect()
    }
}

/// A user message sent to the agent, with routing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl SendMessageRequest {
    /// A new user message carrying a single text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message: Message::new(Role::User, vec![Part::text(text)]),
            metadata: Map::new(),
        }
    }

    /// Continue an existing (non-terminal) task.
    pub fn continue_task(mut self, task_id: TaskId) -> Self {
        self.message.task_id = Some(task_id);
        self
    }

    /// Reference a (possibly completed) task as context.
    pub fn reference(mut self, task_id: TaskId) -> Self {
        self.message.reference_task_ids.push(task_id);
        self
    }

    /// Route the message to a specific skill.
    pub fn skill(mut self, skill_id: impl Into<String>) -> Self {
        self.metadata
            .insert("skillId".to_string(), Value::String(skill_id.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(binding: &str) -> AgentInterface {
        AgentInterface {
            url: format!("http://agent/{binding}"),
            protocol_binding: binding.to_string(),
        }
    }

    #[test]
    fn advertised_bindings_are_deduplicated() {
        let card = AgentCard {
            name: "test".to_string(),
            supported_interfaces: vec![iface("JSONRPC"), iface("GRPC"), iface("JSONRPC"), iface("")],
            ..AgentCard::default()
        };
        assert_eq!(card.advertised_bindings(), vec!["JSONRPC", "GRPC"]);
    }

    #[test]
    fn request_builder_sets_routing() {
        let req = SendMessageRequest::text("hello")
            .continue_task(TaskId::from("t-1"))
            .reference(TaskId::from("t-0"))
            .skill("summarize");

        assert_eq!(req.message.role, Role::User);
        assert_eq!(req.message.task_id, Some(TaskId::from("t-1")));
        assert_eq!(req.message.reference_task_ids, vec![TaskId::from("t-0")]);
        assert_eq!(req.metadata["skillId"], "summarize");
        assert!(!req.message.message_id.is_empty());
    }

    #[test]
    fn card_parses_with_missing_optional_fields() {
        let card: AgentCard = serde_json::from_str(
            r#"{"name":"TCK Core Agent","supportedInterfaces":[{"url":"http://x","protocolBinding":"JSONRPC"}],"capabilities":{"streaming":true},"skills":[{"id":"echo","securityRequirements":[{"bearer":[]}]}]}"#,
        )
        .unwrap();
        assert!(card.capabilities.streaming);
        assert_eq!(card.skills[0].security_schemes(), vec!["bearer"]);
    }
}
