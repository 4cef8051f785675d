//! Conversation turn types.
//!
//! A [`Turn`] is one message in a transcript. The serialized shape
//! `{"from": ..., "value": ...}` is what downstream dataset tooling consumes,
//! so the field names are fixed.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Who a turn is attributed to.
///
/// Older transcripts tag assistant turns as `gpt`; that spelling is still
/// accepted on read but never written. `Display` and `<&'static str>::from`
/// both yield the written form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[strum(to_string = "system")]
    System,
    #[strum(to_string = "human")]
    Human,
    #[serde(alias = "gpt")]
    #[strum(to_string = "assistant", serialize = "gpt")]
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(rename = "from")]
    pub role: Role,
    #[serde(rename = "value")]
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// The empty system turn every conversation starts with.
    pub fn system_empty() -> Self {
        Self::new(Role::System, "")
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Role::Human, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_turn_serializes_with_external_field_names() {
        let json = serde_json::to_value(Turn::human("Hi")).unwrap();
        assert_eq!(json, serde_json::json!({"from": "human", "value": "Hi"}));
    }

    #[test]
    fn test_gpt_alias_reads_as_assistant() {
        let turn: Turn = serde_json::from_str(r#"{"from":"gpt","value":"Hello!"}"#).unwrap();
        assert_eq!(turn, Turn::assistant("Hello!"));
        assert_eq!(Role::from_str("gpt").unwrap(), Role::Assistant);
    }

    #[test]
    fn test_role_string_forms() {
        assert_eq!(<&'static str>::from(Role::Assistant), "assistant");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::from_str("human").unwrap(), Role::Human);
        assert!(Role::from_str("narrator").is_err());
    }
}
