use serde::Deserialize;
use serde_json::{Map, Value};

/// One conversation of a ChatGPT-style export.
///
/// `mapping` keeps node ids in document order; extraction walks it flat,
/// without rebuilding the parent/child tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub create_time: Option<f64>,
    #[serde(default)]
    pub mapping: Map<String, Value>,
}

impl Conversation {
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn from_export_value(value: &Value) -> Role {
        match value.as_str() {
            Some("user") => Role::User,
            Some("assistant") => Role::Assistant,
            Some(other) => Role::Other(other.to_owned()),
            None => Role::Other(value.to_string()),
        }
    }

    /// Only user and assistant turns make it into the transcript.
    pub fn is_forwarded(&self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }

    pub fn header_label(&self) -> String {
        match self {
            Role::User => "USER".to_owned(),
            Role::Assistant => "ASSISTANT".to_owned(),
            Role::Other(raw) => raw.to_uppercase(),
        }
    }
}

/// A single element of `content.parts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// A bare JSON string
    Plain(String),
    /// An object carrying a string `text` field
    Wrapped(String),
    Unsupported,
}

impl ContentPart {
    pub fn from_export_value(value: &Value) -> ContentPart {
        match value {
            Value::String(text) => ContentPart::Plain(text.clone()),
            Value::Object(obj) => match obj.get("text").and_then(Value::as_str) {
                Some(text) => ContentPart::Wrapped(text.to_owned()),
                None => ContentPart::Unsupported,
            },
            _ => ContentPart::Unsupported,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ContentPart::Plain(text) | ContentPart::Wrapped(text) => Some(text),
            ContentPart::Unsupported => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl Message {
    /// Parts joined with newlines; unsupported parts are left out entirely.
    pub fn content(&self) -> String {
        self.parts
            .iter()
            .filter_map(ContentPart::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What a mapping node holds, decided once so extraction never pokes at raw JSON.
#[derive(Debug, Clone)]
pub enum NodeMessage {
    Absent,
    Present(Message),
    Malformed(String),
}

impl NodeMessage {
    pub fn from_node(node: &Value) -> NodeMessage {
        let Some(node) = node.as_object() else {
            return NodeMessage::Absent;
        };

        let message = match node.get("message") {
            None | Some(Value::Null) => return NodeMessage::Absent,
            Some(Value::Object(obj)) if obj.is_empty() => return NodeMessage::Absent,
            Some(Value::Object(obj)) => obj,
            Some(_) => return NodeMessage::Malformed("message is not an object".to_owned()),
        };

        let Some(author) = message.get("author").and_then(Value::as_object) else {
            return NodeMessage::Malformed("message has no author".to_owned());
        };
        let Some(role) = author.get("role") else {
            return NodeMessage::Malformed("message author has no role".to_owned());
        };

        let parts = message
            .get("content")
            .and_then(Value::as_object)
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .map(|parts| parts.iter().map(ContentPart::from_export_value).collect())
            .unwrap_or_default();

        NodeMessage::Present(Message {
            role: Role::from_export_value(role),
            parts,
        })
    }
}
