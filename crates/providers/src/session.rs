use serde::Deserialize;

use chatbox_config::ApiMode;

/// The slice of a chat session that decides where its requests go.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Session {
    /// Pre-mode model identifier, consulted when `api_mode` is absent.
    pub model_name: String,
    pub api_mode: Option<ApiMode>,
}

impl Session {
    #[must_use]
    pub fn from_model_name(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            api_mode: None,
        }
    }

    #[must_use]
    pub fn from_api_mode(api_mode: ApiMode) -> Self {
        Self {
            model_name: String::new(),
            api_mode: Some(api_mode),
        }
    }

    /// The session's mode when it belongs to the custom group.
    #[must_use]
    pub fn custom_mode(&self) -> Option<&ApiMode> {
        self.api_mode
            .as_ref()
            .filter(|mode| mode.group_name.is_custom())
    }
}
