use crate::contact::CapturedContact;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("chat integration not loaded")]
    NotLoaded,
    #[error("chat open failed: {0}")]
    Invoke(String),
}

/// Settings object published before the chat surface opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub user: ChatUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub email: String,
    pub unique_client_id: String,
}

impl ChatSettings {
    /// The contact email is both the display identity and the client id.
    pub fn for_contact(contact: &CapturedContact) -> Self {
        Self::for_email(contact.email())
    }

    /// Settings for a previously stored value, which is passed through unchecked.
    pub fn for_email(email: &str) -> Self {
        Self {
            user: ChatUser {
                email: email.to_string(),
                unique_client_id: email.to_string(),
            },
        }
    }
}

/// Capability the widget uses to reach the external chat surface.
pub trait ChatIntegration {
    fn configure(&self, settings: &ChatSettings);
    fn open(&self) -> Result<(), ChatError>;
}

pub type MethodOpen = Box<dyn Fn() -> Result<(), ChatError>>;
pub type CallableOpen = Box<dyn Fn(&str) -> Result<(), ChatError>>;

/// Entry point exposed by a loaded chat SDK.
pub enum ChatHandle {
    /// `handle.open()`
    Method(MethodOpen),
    /// `handle("open")`
    Callable(CallableOpen),
}

impl ChatHandle {
    /// Picks the method-style entry point when both are offered.
    pub fn resolve(method: Option<MethodOpen>, callable: Option<CallableOpen>) -> Option<Self> {
        match (method, callable) {
            (Some(open), _) => Some(Self::Method(open)),
            (None, Some(call)) => Some(Self::Callable(call)),
            (None, None) => None,
        }
    }

    pub fn open(&self) -> Result<(), ChatError> {
        match self {
            Self::Method(open) => open(),
            Self::Callable(call) => call("open"),
        }
    }
}

impl std::fmt::Debug for ChatHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Method(_) => f.write_str("ChatHandle::Method"),
            Self::Callable(_) => f.write_str("ChatHandle::Callable"),
        }
    }
}

/// Environment hosting the chat SDK (the page globals in a browser).
///
/// The handle is looked up on every open because the SDK loads asynchronously.
pub trait ChatHost {
    fn publish_settings(&self, settings: &ChatSettings);
    fn resolve_handle(&self) -> Option<ChatHandle>;
}

/// [`ChatIntegration`] backed by whatever the host exposes at call time.
#[derive(Debug, Clone)]
pub struct HostedChat<H> {
    host: H,
}

impl<H: ChatHost> HostedChat<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }
}

impl<H: ChatHost> ChatIntegration for HostedChat<H> {
    fn configure(&self, settings: &ChatSettings) {
        self.host.publish_settings(settings);
    }

    fn open(&self) -> Result<(), ChatError> {
        self.host.resolve_handle().ok_or(ChatError::NotLoaded)?.open()
    }
}
