use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Author of a canonical message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role as it appears on older generations and external protocol messages.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    System,
    User,
    Assistant,
    Tool,
}

impl WireRole {
    /// Parse a wire role name, returning `None` for anything unrecognized.
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "system" => Some(WireRole::System),
            "user" => Some(WireRole::User),
            "assistant" => Some(WireRole::Assistant),
            "tool" => Some(WireRole::Tool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WireRole::System => "system",
            WireRole::User => "user",
            WireRole::Assistant => "assistant",
            WireRole::Tool => "tool",
        }
    }
}

impl Display for WireRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Role> for WireRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => WireRole::User,
            Role::Assistant => WireRole::Assistant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(WireRole::Tool.to_string(), "tool");
    }

    #[test]
    fn test_wire_role_parse() {
        assert_eq!(WireRole::parse("system"), Some(WireRole::System));
        assert_eq!(WireRole::parse("tool"), Some(WireRole::Tool));
        assert_eq!(WireRole::parse("function"), None);
        assert_eq!(WireRole::parse("User"), None);
    }
}
