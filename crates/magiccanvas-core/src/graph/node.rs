//! Graph nodes and their kind-specific payloads.

use super::GraphError;
use kurbo::{Point, Rect, Size};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Data keys of a node, as stored and as patched.
pub type NodeData = Map<String, Value>;

/// Closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Free text card.
    Custom,
    /// Chat with a language model.
    AiChat,
    /// Prompt-to-image card.
    AiImage,
    /// Prompt-to-UI-markup card.
    UiGenerator,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Custom,
        NodeKind::AiChat,
        NodeKind::AiImage,
        NodeKind::UiGenerator,
    ];

    /// Type string used by the graph view and in stored documents.
    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::Custom => "custom",
            NodeKind::AiChat => "ai",
            NodeKind::AiImage => "aiImage",
            NodeKind::UiGenerator => "tailwind",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        NodeKind::ALL.into_iter().find(|k| k.type_name() == name)
    }

    pub fn default_label(self) -> &'static str {
        match self {
            NodeKind::Custom => "Text Node",
            NodeKind::AiChat => "AI Response",
            NodeKind::AiImage => "AI Image",
            NodeKind::UiGenerator => "Tailwind UI",
        }
    }
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Payload of a custom text node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPayload {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content: String,
    /// Keys this payload does not model, kept for round trips.
    #[serde(flatten)]
    pub extra: NodeData,
}

/// Payload of an AI chat node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub extra: NodeData,
}

/// Payload of an AI image node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    #[serde(default)]
    pub label: String,
    /// Current prompt.
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
    #[serde(flatten)]
    pub extra: NodeData,
}

/// Payload of a UI generator node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPayload {
    #[serde(default)]
    pub label: String,
    /// Current prompt.
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_code: Option<String>,
    #[serde(flatten)]
    pub extra: NodeData,
}

/// Kind-tagged node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    Custom(TextPayload),
    AiChat(ChatPayload),
    AiImage(ImagePayload),
    UiGenerator(UiPayload),
}

impl NodePayload {
    /// Fresh payload with the kind's default label and empty content.
    pub fn new(kind: NodeKind) -> Self {
        let label = kind.default_label().to_string();
        match kind {
            NodeKind::Custom => NodePayload::Custom(TextPayload {
                label,
                ..Default::default()
            }),
            NodeKind::AiChat => NodePayload::AiChat(ChatPayload {
                label,
                ..Default::default()
            }),
            NodeKind::AiImage => NodePayload::AiImage(ImagePayload {
                label,
                ..Default::default()
            }),
            NodeKind::UiGenerator => NodePayload::UiGenerator(UiPayload {
                label,
                ..Default::default()
            }),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Custom(_) => NodeKind::Custom,
            NodePayload::AiChat(_) => NodeKind::AiChat,
            NodePayload::AiImage(_) => NodeKind::AiImage,
            NodePayload::UiGenerator(_) => NodeKind::UiGenerator,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NodePayload::Custom(p) => &p.label,
            NodePayload::AiChat(p) => &p.label,
            NodePayload::AiImage(p) => &p.label,
            NodePayload::UiGenerator(p) => &p.label,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            NodePayload::Custom(p) => &p.content,
            NodePayload::AiChat(p) => &p.content,
            NodePayload::AiImage(p) => &p.content,
            NodePayload::UiGenerator(p) => &p.content,
        }
    }

    /// Flatten to the stored data map.
    pub fn to_data(&self) -> Result<NodeData, GraphError> {
        let value = match self {
            NodePayload::Custom(p) => serde_json::to_value(p),
            NodePayload::AiChat(p) => serde_json::to_value(p),
            NodePayload::AiImage(p) => serde_json::to_value(p),
            NodePayload::UiGenerator(p) => serde_json::to_value(p),
        }
        .map_err(|e| GraphError::Payload(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(GraphError::Payload(format!("expected object, got {other}"))),
        }
    }

    /// Rebuild from a stored data map.
    pub fn from_data(kind: NodeKind, data: NodeData) -> Result<Self, GraphError> {
        fn parse<T: DeserializeOwned>(data: NodeData) -> Result<T, GraphError> {
            serde_json::from_value(Value::Object(data)).map_err(|e| GraphError::Payload(e.to_string()))
        }
        Ok(match kind {
            NodeKind::Custom => NodePayload::Custom(parse(data)?),
            NodeKind::AiChat => NodePayload::AiChat(parse(data)?),
            NodeKind::AiImage => NodePayload::AiImage(parse(data)?),
            NodeKind::UiGenerator => NodePayload::UiGenerator(parse(data)?),
        })
    }

    /// Shallow-merge `patch` into the data keys. On error the payload is unchanged.
    pub fn merge(&mut self, patch: NodeData) -> Result<(), GraphError> {
        let mut data = self.to_data()?;
        data.extend(patch);
        *self = Self::from_data(self.kind(), data)?;
        Ok(())
    }
}

/// What the graph view needs to draw a node card.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCard {
    pub kind: NodeKind,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub code: Option<String>,
    /// Cards accept an incoming edge on top and emit one at the bottom.
    pub has_target_handle: bool,
    pub has_source_handle: bool,
}

/// Behavior every node kind provides to the graph view.
pub trait NodeBehavior {
    /// Describe the card for rendering.
    fn render(&self) -> NodeCard;

    /// Merge a partial data patch, as the card's editor does on change.
    fn update_payload(&mut self, patch: NodeData) -> Result<(), GraphError>;
}

/// A node in the graph layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub position: Point,
    pub payload: NodePayload,
    pub selected: bool,
    /// Stored type this build has no kind for. Loaded as custom, saved back unchanged.
    pub stored_type: Option<String>,
}

impl GraphNode {
    /// Nominal card size used for framing the view.
    pub const CARD_SIZE: Size = Size::new(300.0, 150.0);

    pub fn new(id: impl Into<String>, kind: NodeKind, position: Point) -> Self {
        Self {
            id: id.into(),
            position,
            payload: NodePayload::new(kind),
            selected: false,
            stored_type: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    /// Type string written to storage.
    pub fn type_name(&self) -> &str {
        self.stored_type
            .as_deref()
            .unwrap_or_else(|| self.kind().type_name())
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, Self::CARD_SIZE)
    }
}

impl NodeBehavior for GraphNode {
    fn render(&self) -> NodeCard {
        let mut card = NodeCard {
            kind: self.kind(),
            title: self.payload.label().to_string(),
            body: self.payload.content().to_string(),
            image_url: None,
            code: None,
            has_target_handle: true,
            has_source_handle: true,
        };
        match &self.payload {
            NodePayload::Custom(_) => {}
            NodePayload::AiChat(chat) => {
                if let Some(last) = chat.messages.last() {
                    card.body = last.content.clone();
                }
            }
            NodePayload::AiImage(image) => card.image_url = image.image_url.clone(),
            NodePayload::UiGenerator(ui) => card.code = ui.ui_code.clone(),
        }
        card
    }

    fn update_payload(&mut self, patch: NodeData) -> Result<(), GraphError> {
        self.payload.merge(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> NodeData {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_type_names() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_type_name(kind.type_name()), Some(kind));
        }
        assert_eq!(NodeKind::from_type_name("input"), None);
        assert_eq!(NodeKind::AiChat.type_name(), "ai");
        assert_eq!(NodeKind::UiGenerator.default_label(), "Tailwind UI");
    }

    #[test]
    fn test_new_payload_data() {
        let payload = NodePayload::new(NodeKind::Custom);
        assert_eq!(
            payload.to_data().unwrap(),
            data(json!({ "label": "Text Node", "content": "" }))
        );
    }

    #[test]
    fn test_merge_keeps_untouched_keys() {
        let mut payload = NodePayload::new(NodeKind::AiImage);
        payload
            .merge(data(json!({ "content": "a cat", "imageUrl": "https://img/1.png" })))
            .unwrap();
        payload.merge(data(json!({ "style": "Portrait" }))).unwrap();

        let NodePayload::AiImage(image) = &payload else {
            panic!("kind changed");
        };
        assert_eq!(image.label, "AI Image");
        assert_eq!(image.content, "a cat");
        assert_eq!(image.image_url.as_deref(), Some("https://img/1.png"));
        assert_eq!(image.extra.get("style"), Some(&json!("Portrait")));
    }

    #[test]
    fn test_bad_patch_leaves_payload() {
        let mut payload = NodePayload::new(NodeKind::Custom);
        let before = payload.clone();
        assert!(payload.merge(data(json!({ "content": 42 }))).is_err());
        assert_eq!(payload, before);
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let stored = data(json!({ "label": "Note", "content": "x", "color": "red" }));
        let payload = NodePayload::from_data(NodeKind::Custom, stored.clone()).unwrap();
        assert_eq!(payload.to_data().unwrap(), stored);
    }

    #[test]
    fn test_render_cards() {
        let mut node = GraphNode::new("node-1", NodeKind::AiChat, Point::ZERO);
        if let NodePayload::AiChat(chat) = &mut node.payload {
            chat.messages.push(ChatMessage::user("hi"));
            chat.messages.push(ChatMessage::assistant("hello"));
        }
        let card = node.render();
        assert_eq!(card.title, "AI Response");
        assert_eq!(card.body, "hello");

        let mut ui = GraphNode::new("node-2", NodeKind::UiGenerator, Point::ZERO);
        ui.update_payload(data(json!({ "uiCode": "<div/>" }))).unwrap();
        assert_eq!(ui.render().code.as_deref(), Some("<div/>"));
    }
}
