use crate::forward::ForwardTarget;
use crate::storage::DEFAULT_CONTACT_KEY;
use serde::{Deserialize, Serialize};

/// Widget settings shared by the page injector and the browser binding.
///
/// Every field has a default, so partial TOML or JSON documents are fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub root_id: String,
    pub storage_key: String,
    pub label: String,
    pub intro: Vec<String>,
    pub placeholder: String,
    pub submit_label: String,
    pub busy_label: String,
    pub theme: WidgetTheme,
    pub forward: ForwardTarget,
    pub chat: ChatSdkConfig,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            root_id: "elementary-kapa-support-root".to_string(),
            storage_key: DEFAULT_CONTACT_KEY.to_string(),
            label: "OSS Support".to_string(),
            intro: vec![
                "Ask the Community Agent anything about Elementary OSS.".to_string(),
                "Leave your email in case a follow up is needed:".to_string(),
            ],
            placeholder: "you@company.com".to_string(),
            submit_label: "Start chat".to_string(),
            busy_label: "Opening\u{2026}".to_string(),
            theme: WidgetTheme::default(),
            forward: ForwardTarget::default(),
            chat: ChatSdkConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetTheme {
    pub primary: String,
    pub primary_hover: String,
    pub font_family: String,
}

impl Default for WidgetTheme {
    fn default() -> Self {
        Self {
            primary: "#FF20B8".to_string(),
            primary_hover: "#E01A9F".to_string(),
            font_family: "system-ui,-apple-system,sans-serif".to_string(),
        }
    }
}

/// Third-party chat SDK: its script tag and the page globals it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSdkConfig {
    pub script_src: String,
    pub website_id: String,
    pub project_name: String,
    pub project_color: String,
    pub project_logo: String,
    /// Global the SDK reads user settings from.
    pub settings_global: String,
    /// Global the SDK installs its open entry point on.
    pub handle_global: String,
}

impl Default for ChatSdkConfig {
    fn default() -> Self {
        Self {
            script_src: "https://widget.kapa.ai/kapa-widget.bundle.js".to_string(),
            website_id: "e558d15b-d976-4a89-b2f0-e33ee6dab58b".to_string(),
            project_name: "Elementary Community Agent".to_string(),
            project_color: "#FF20B8".to_string(),
            project_logo: "https://res.cloudinary.com/do5hrgokq/image/upload/v1771424391/Elementary_2025_Pink_Mark_Black_Frame_rbexli.png".to_string(),
            settings_global: "kapaSettings".to_string(),
            handle_global: "Kapa".to_string(),
        }
    }
}
