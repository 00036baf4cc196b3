//! # DevTools State
//!
//! The persisted shape. Field names are camelCase on disk so a value
//! written by the web client reads back unchanged.

use serde::{Deserialize, Deserializer, Serialize};

/// Role identifier meaning "stop impersonating, act as myself"
pub const SELF_ROLE: &str = "self";

/// Map a requested role onto the stored one
///
/// `"self"` is never stored; it becomes `None`. Anything else is kept
/// verbatim.
pub fn normalize_role(role: &str) -> Option<String> {
    if role == SELF_ROLE {
        None
    } else {
        Some(role.to_string())
    }
}

/// Developer-tools UI state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevToolsState {
    /// Whether the dev-tools panel is shown
    pub visible: bool,

    /// Whether clicking an element in the preview selects it
    pub allow_selection: bool,

    /// Role being impersonated, `None` when acting as self
    #[serde(default, deserialize_with = "deserialize_role")]
    pub role: Option<String>,
}

/// Stored `"self"` (older clients, other windows) reads back as `None`
fn deserialize_role<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let role = Option::<String>::deserialize(deserializer)?;
    Ok(role.as_deref().and_then(normalize_role))
}

impl DevToolsState {
    pub fn with_visible(self, visible: bool) -> Self {
        Self { visible, ..self }
    }

    pub fn with_allow_selection(self, allow_selection: bool) -> Self {
        Self {
            allow_selection,
            ..self
        }
    }

    /// Set the impersonated role, normalizing `"self"` away
    pub fn with_role(self, role: Option<&str>) -> Self {
        Self {
            role: role.and_then(normalize_role),
            ..self
        }
    }

    pub fn is_impersonating(&self) -> bool {
        self.role.is_some()
    }
}
