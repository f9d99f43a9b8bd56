use crate::contact::CapturedContact;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HUBSPOT_SUBMIT_BASE: &str = "https://api.hsforms.com/submissions/v3/integration/submit";

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("no async runtime to dispatch the forward on")]
    NoRuntime,
    #[error("invalid forward endpoint: {0}")]
    Endpoint(String),
    #[error("forward request failed: {0}")]
    Transport(String),
    #[error("forward endpoint answered {0}")]
    Status(u16),
}

/// Lead-capture form the contact is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardTarget {
    pub portal_id: String,
    pub form_id: String,
    /// Fixed campaign label sent as `context.pageName`.
    pub page_name: String,
    /// Full endpoint override; used as-is when set.
    pub submit_url: Option<String>,
    /// Same-origin relay path; the browser posts `{ email, page_uri }` here instead.
    pub proxy_path: Option<String>,
}

impl Default for ForwardTarget {
    fn default() -> Self {
        Self {
            portal_id: "142608385".to_string(),
            form_id: "4734860b-68fb-4f7f-aada-afb14e61afe7".to_string(),
            page_name: "Elementary Docs - Community Agent".to_string(),
            submit_url: None,
            proxy_path: None,
        }
    }
}

impl ForwardTarget {
    pub fn submit_url(&self) -> String {
        match &self.submit_url {
            Some(url) => url.clone(),
            None => format!("{HUBSPOT_SUBMIT_BASE}/{}/{}", self.portal_id, self.form_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionContext {
    pub page_uri: String,
    pub page_name: String,
}

/// JSON body of a form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub fields: Vec<FormField>,
    pub context: SubmissionContext,
}

impl FormSubmission {
    pub fn for_contact(contact: &CapturedContact, page_uri: &str, page_name: &str) -> Self {
        Self {
            fields: vec![FormField {
                name: "email".to_string(),
                value: contact.email().to_string(),
            }],
            context: SubmissionContext {
                page_uri: page_uri.to_string(),
                page_name: page_name.to_string(),
            },
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == "email")
            .map(|f| f.value.as_str())
    }
}

/// Body the browser posts to a same-origin relay instead of the form endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRelay {
    pub email: String,
    pub page_uri: String,
}

/// Fire-and-forget delivery of a captured contact.
///
/// `forward` must return without waiting on the network. An `Err` only means
/// the request could not be dispatched at all.
pub trait ContactForwarder {
    fn forward(&self, submission: FormSubmission) -> Result<(), ForwardError>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use http_forwarder::HttpForwarder;

#[cfg(not(target_arch = "wasm32"))]
mod http_forwarder {
    use super::{ContactForwarder, ForwardError, FormSubmission};
    use tracing::{debug, warn};

    /// Posts submissions with `reqwest` on the ambient tokio runtime.
    #[derive(Debug, Clone)]
    pub struct HttpForwarder {
        client: reqwest::Client,
        endpoint: url::Url,
    }

    impl HttpForwarder {
        pub fn new(endpoint: &str) -> Result<Self, ForwardError> {
            let endpoint =
                url::Url::parse(endpoint).map_err(|e| ForwardError::Endpoint(e.to_string()))?;
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| ForwardError::Transport(e.to_string()))?;
            Ok(Self { client, endpoint })
        }

        /// Sends one submission and waits for the status line. The body is ignored.
        pub async fn send(&self, submission: &FormSubmission) -> Result<(), ForwardError> {
            let resp = self
                .client
                .post(self.endpoint.clone())
                .json(submission)
                .send()
                .await
                .map_err(|e| ForwardError::Transport(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ForwardError::Status(status.as_u16()));
            }
            debug!(endpoint = %self.endpoint, %status, "contact forwarded");
            Ok(())
        }
    }

    impl ContactForwarder for HttpForwarder {
        fn forward(&self, submission: FormSubmission) -> Result<(), ForwardError> {
            let handle =
                tokio::runtime::Handle::try_current().map_err(|_| ForwardError::NoRuntime)?;
            let forwarder = self.clone();
            handle.spawn(async move {
                if let Err(err) = forwarder.send(&submission).await {
                    warn!(endpoint = %forwarder.endpoint, %err, "contact forward failed; ignoring");
                }
            });
            Ok(())
        }
    }
}
