use crate::config::{DEFAULT_CONFIRM_DESTRUCTIVE, default_confirm_destructive};

use serde::{Deserialize, Serialize};

/// Application behaviour configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Ask before reset and delete. When false those prompts auto-accept.
    #[serde(default = "default_confirm_destructive")]
    pub confirm_destructive: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            confirm_destructive: DEFAULT_CONFIRM_DESTRUCTIVE,
        }
    }
}
