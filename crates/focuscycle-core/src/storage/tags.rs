//! Task tags attached to session log entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TAG_COLOR: &str = "#4B8BF4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagAxis {
    #[default]
    WorkType,
    Client,
    Other,
}

impl TagAxis {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work_type" | "worktype" | "work" => Some(TagAxis::WorkType),
            "client" => Some(TagAxis::Client),
            "other" => Some(TagAxis::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTag {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_color")]
    pub color_hex: String,
    #[serde(default)]
    pub axis: TagAxis,
    #[serde(default)]
    pub archived: bool,
}

fn default_color() -> String {
    DEFAULT_TAG_COLOR.to_string()
}

fn new_tag_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl TaskTag {
    pub fn new(name: impl Into<String>, axis: TagAxis) -> Self {
        Self {
            id: new_tag_id(),
            name: name.into().trim().to_string(),
            color_hex: default_color(),
            axis,
            archived: false,
        }
    }
}

/// Drop nameless tags, fill blank ids and colors, trim text.
///
/// Returns true if anything changed.
pub(crate) fn normalize_tags(tags: &mut Vec<TaskTag>) -> bool {
    let before = tags.clone();
    tags.retain(|t| !t.name.trim().is_empty());
    for tag in tags.iter_mut() {
        if tag.id.trim().is_empty() {
            tag.id = new_tag_id();
        }
        if tag.color_hex.trim().is_empty() {
            tag.color_hex = default_color();
        }
        tag.name = tag.name.trim().to_string();
        tag.color_hex = tag.color_hex.trim().to_string();
    }
    *tags != before
}
