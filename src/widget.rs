//! Contact-capture state machine behind the floating support control.
//!
//! The widget owns no UI. Renderers feed it events (`activate`, `set_draft`,
//! `pointer_down`, `submit`) and draw whatever [`SupportWidget::view`] returns.
//! Every infrastructure failure is reported to the diagnostic sink and then
//! dropped; only [`CaptureError`]s ever reach the user.

use crate::chat::{ChatIntegration, ChatSettings};
use crate::contact::{CaptureError, CapturedContact};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, TracingDiagnostics};
use crate::forward::{ContactForwarder, ForwardTarget, FormSubmission};
use crate::storage::{DEFAULT_CONTACT_KEY, KeyValueStore};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Idle,
    CapturingEmail,
    /// Held only inside [`SupportWidget::submit`], which never yields, so a
    /// renderer driven from the public events never observes it.
    Submitting,
}

/// Where a pointer-down landed relative to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Control,
    Popover,
    Outside,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A stored contact existed; the chat surface was asked to open with it.
    OpenedChat(String),
    ShowedForm,
    Dismissed,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Captured(CapturedContact),
    Rejected(CaptureError),
    /// Submit arrived while the form was not showing.
    Ignored,
}

/// Everything a renderer needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WidgetView {
    pub popover_open: bool,
    pub draft: String,
    pub error: Option<String>,
    pub submitting: bool,
}

pub struct SupportWidget {
    state: WidgetState,
    draft: String,
    error: Option<CaptureError>,
    contact_key: String,
    page_name: String,
    store: Box<dyn KeyValueStore>,
    chat: Box<dyn ChatIntegration>,
    forwarder: Box<dyn ContactForwarder>,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl SupportWidget {
    pub fn new(
        store: impl KeyValueStore + 'static,
        chat: impl ChatIntegration + 'static,
        forwarder: impl ContactForwarder + 'static,
    ) -> Self {
        Self {
            state: WidgetState::Idle,
            draft: String::new(),
            error: None,
            contact_key: DEFAULT_CONTACT_KEY.to_string(),
            page_name: ForwardTarget::default().page_name,
            store: Box::new(store),
            chat: Box::new(chat),
            forwarder: Box::new(forwarder),
            diagnostics: Box::new(TracingDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    pub fn with_contact_key(mut self, key: impl Into<String>) -> Self {
        self.contact_key = key.into();
        self
    }

    pub fn with_page_name(mut self, page_name: impl Into<String>) -> Self {
        self.page_name = page_name.into();
        self
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn view(&self) -> WidgetView {
        WidgetView {
            popover_open: self.state != WidgetState::Idle,
            draft: self.draft.clone(),
            error: self.error.map(|e| e.to_string()),
            submitting: self.state == WidgetState::Submitting,
        }
    }

    /// The control was clicked.
    pub fn activate(&mut self) -> Activation {
        if self.state == WidgetState::Submitting {
            return Activation::Ignored;
        }
        if let Some(email) = self.read_stored_contact() {
            self.state = WidgetState::Idle;
            self.open_chat_surface(&ChatSettings::for_email(&email));
            return Activation::OpenedChat(email);
        }
        match self.state {
            WidgetState::Idle => {
                self.draft.clear();
                self.error = None;
                self.state = WidgetState::CapturingEmail;
                Activation::ShowedForm
            }
            _ => {
                self.error = None;
                self.state = WidgetState::Idle;
                Activation::Dismissed
            }
        }
    }

    pub fn set_draft(&mut self, value: impl Into<String>) {
        if self.state == WidgetState::CapturingEmail {
            self.draft = value.into();
        }
    }

    /// Returns true when the event dismissed the form.
    pub fn pointer_down(&mut self, target: PointerTarget) -> bool {
        if self.state != WidgetState::CapturingEmail || target != PointerTarget::Outside {
            return false;
        }
        self.state = WidgetState::Idle;
        true
    }

    /// Submits the current draft from the page at `page_uri`.
    pub fn submit(&mut self, page_uri: &str) -> SubmitOutcome {
        if self.state != WidgetState::CapturingEmail {
            return SubmitOutcome::Ignored;
        }
        let contact = match CapturedContact::parse(&self.draft) {
            Ok(contact) => contact,
            Err(err) => {
                self.error = Some(err);
                return SubmitOutcome::Rejected(err);
            }
        };

        self.error = None;
        self.state = WidgetState::Submitting;
        self.persist_contact(&contact);
        self.forward_contact(&contact, page_uri);
        self.open_chat_surface(&ChatSettings::for_contact(&contact));
        self.draft.clear();
        self.state = WidgetState::Idle;
        debug!(target: "docs_support::widget", "contact captured");
        SubmitOutcome::Captured(contact)
    }

    /// The trimmed stored value. Blank or unreadable slots count as no contact.
    ///
    /// The value is not re-validated: whatever a previous capture or another
    /// script left in the slot is handed to the chat surface as-is.
    pub fn read_stored_contact(&self) -> Option<String> {
        let raw = match self.store.read(&self.contact_key) {
            Ok(raw) => raw?,
            Err(err) => {
                self.diagnostics.report(DiagnosticEvent::StorageRead {
                    key: self.contact_key.clone(),
                    reason: err.to_string(),
                });
                return None;
            }
        };
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn persist_contact(&self, contact: &CapturedContact) {
        if let Err(err) = self.store.write(&self.contact_key, contact.email()) {
            self.diagnostics.report(DiagnosticEvent::StorageWrite {
                key: self.contact_key.clone(),
                reason: err.to_string(),
            });
        }
    }

    fn forward_contact(&self, contact: &CapturedContact, page_uri: &str) {
        let submission = FormSubmission::for_contact(contact, page_uri, &self.page_name);
        if let Err(err) = self.forwarder.forward(submission) {
            self.diagnostics.report(DiagnosticEvent::ForwardDispatch {
                reason: err.to_string(),
            });
        }
    }

    fn open_chat_surface(&self, settings: &ChatSettings) {
        self.chat.configure(settings);
        if let Err(err) = self.chat.open() {
            self.diagnostics.report(DiagnosticEvent::ChatUnavailable {
                reason: err.to_string(),
            });
        }
    }
}

impl std::fmt::Debug for SupportWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupportWidget")
            .field("state", &self.state)
            .field("draft", &self.draft)
            .field("error", &self.error)
            .field("contact_key", &self.contact_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatError;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::forward::ForwardError;
    use crate::storage::{MemoryStore, StorageError};
    use std::cell::RefCell;
    use std::rc::Rc;

    const PAGE: &str = "https://docs.example.com/quickstart";

    #[derive(Clone, Default)]
    struct RecordingChat {
        configured: Rc<RefCell<Vec<ChatSettings>>>,
        opened: Rc<RefCell<usize>>,
        loaded: bool,
    }

    impl RecordingChat {
        fn loaded() -> Self {
            Self {
                loaded: true,
                ..Default::default()
            }
        }

        fn opened_with(&self) -> Vec<String> {
            self.configured
                .borrow()
                .iter()
                .map(|s| s.user.email.clone())
                .collect()
        }
    }

    impl ChatIntegration for RecordingChat {
        fn configure(&self, settings: &ChatSettings) {
            self.configured.borrow_mut().push(settings.clone());
        }

        fn open(&self) -> Result<(), ChatError> {
            if !self.loaded {
                return Err(ChatError::NotLoaded);
            }
            *self.opened.borrow_mut() += 1;
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingForwarder {
        sent: Rc<RefCell<Vec<FormSubmission>>>,
    }

    impl ContactForwarder for RecordingForwarder {
        fn forward(&self, submission: FormSubmission) -> Result<(), ForwardError> {
            self.sent.borrow_mut().push(submission);
            Ok(())
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("denied".into()))
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Rejected("quota".into()))
        }
    }

    struct Harness {
        widget: SupportWidget,
        store: MemoryStore,
        chat: RecordingChat,
        forwarder: RecordingForwarder,
        diagnostics: RecordingDiagnostics,
    }

    fn harness_with(store: MemoryStore) -> Harness {
        let chat = RecordingChat::loaded();
        let forwarder = RecordingForwarder::default();
        let diagnostics = RecordingDiagnostics::default();
        let widget = SupportWidget::new(store.clone(), chat.clone(), forwarder.clone())
            .with_diagnostics(diagnostics.clone());
        Harness {
            widget,
            store,
            chat,
            forwarder,
            diagnostics,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryStore::new())
    }

    #[test]
    fn first_activation_shows_form() {
        let mut h = harness();
        assert_eq!(h.widget.state(), WidgetState::Idle);
        assert_eq!(h.widget.activate(), Activation::ShowedForm);
        assert_eq!(h.widget.state(), WidgetState::CapturingEmail);
        let view = h.widget.view();
        assert!(view.popover_open);
        assert_eq!(view.error, None);
    }

    #[test]
    fn second_activation_toggles_form_closed() {
        let mut h = harness();
        h.widget.activate();
        assert_eq!(h.widget.activate(), Activation::Dismissed);
        assert_eq!(h.widget.state(), WidgetState::Idle);
        assert!(h.chat.opened_with().is_empty());
    }

    #[test]
    fn valid_submit_persists_forwards_and_opens_chat() {
        let mut h = harness();
        h.widget.activate();
        h.widget.set_draft("  jane@example.com ");
        let outcome = h.widget.submit(PAGE);

        let expected = CapturedContact::parse("jane@example.com").unwrap();
        assert_eq!(outcome, SubmitOutcome::Captured(expected));
        assert_eq!(
            h.store.get(DEFAULT_CONTACT_KEY).as_deref(),
            Some("jane@example.com")
        );
        let sent = h.forwarder.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email(), Some("jane@example.com"));
        assert_eq!(sent[0].context.page_uri, PAGE);
        assert_eq!(sent[0].context.page_name, "Elementary Docs - Community Agent");
        assert_eq!(h.chat.opened_with(), vec!["jane@example.com".to_string()]);
        assert_eq!(*h.chat.opened.borrow(), 1);

        assert_eq!(h.widget.state(), WidgetState::Idle);
        assert_eq!(h.widget.view(), WidgetView::default());
        assert!(h.diagnostics.events().is_empty());
    }

    #[test]
    fn empty_submit_keeps_form_with_error() {
        let mut h = harness();
        h.widget.activate();
        h.widget.set_draft("");
        assert_eq!(
            h.widget.submit(PAGE),
            SubmitOutcome::Rejected(CaptureError::EmptyInput)
        );
        assert_eq!(h.widget.state(), WidgetState::CapturingEmail);
        assert_eq!(
            h.widget.view().error.as_deref(),
            Some("Please enter your email.")
        );
        assert!(h.store.get(DEFAULT_CONTACT_KEY).is_none());
    }

    #[test]
    fn malformed_submit_keeps_form_with_error() {
        let mut h = harness();
        h.widget.activate();
        h.widget.set_draft("not-an-email");
        assert_eq!(
            h.widget.submit(PAGE),
            SubmitOutcome::Rejected(CaptureError::InvalidEmailShape)
        );
        assert_eq!(h.widget.state(), WidgetState::CapturingEmail);
        let view = h.widget.view();
        assert_eq!(
            view.error.as_deref(),
            Some("Please enter a valid email address.")
        );
        assert_eq!(view.draft, "not-an-email");
        assert!(h.forwarder.sent.borrow().is_empty());
        assert!(h.chat.opened_with().is_empty());
    }

    #[test]
    fn error_is_replaced_then_cleared_on_success() {
        let mut h = harness();
        h.widget.activate();
        h.widget.submit(PAGE);
        h.widget.set_draft("bad");
        h.widget.submit(PAGE);
        assert_eq!(
            h.widget.view().error.as_deref(),
            Some("Please enter a valid email address.")
        );
        h.widget.set_draft("a@b.co");
        h.widget.submit(PAGE);
        assert_eq!(h.widget.view().error, None);
    }

    #[test]
    fn stored_contact_skips_form_on_every_activation() {
        let mut h = harness_with(MemoryStore::with_entry(DEFAULT_CONTACT_KEY, "a@b.com"));
        for _ in 0..3 {
            assert_eq!(h.widget.activate(), Activation::OpenedChat("a@b.com".into()));
            assert_eq!(h.widget.state(), WidgetState::Idle);
            assert!(!h.widget.view().popover_open);
        }
        assert_eq!(h.chat.opened_with(), vec!["a@b.com".to_string(); 3]);
        assert!(h.forwarder.sent.borrow().is_empty());
    }

    #[test]
    fn stored_contact_is_trimmed_and_blank_is_absent() {
        let mut h = harness_with(MemoryStore::with_entry(DEFAULT_CONTACT_KEY, " a@b.com\n"));
        h.widget.activate();
        assert_eq!(h.chat.opened_with(), vec!["a@b.com".to_string()]);

        let mut blank = harness_with(MemoryStore::with_entry(DEFAULT_CONTACT_KEY, "   "));
        assert_eq!(blank.widget.activate(), Activation::ShowedForm);
    }

    #[test]
    fn stored_value_opens_chat_without_revalidation() {
        let mut h = harness_with(MemoryStore::with_entry(DEFAULT_CONTACT_KEY, " legacy-user "));
        assert_eq!(
            h.widget.activate(),
            Activation::OpenedChat("legacy-user".into())
        );
        assert_eq!(h.widget.state(), WidgetState::Idle);
        assert_eq!(h.chat.opened_with(), vec!["legacy-user".to_string()]);
        let settings = h.chat.configured.borrow();
        assert_eq!(settings[0].user.unique_client_id, "legacy-user");
        assert!(h.forwarder.sent.borrow().is_empty());
        assert!(h.diagnostics.events().is_empty());
    }

    #[test]
    fn after_capture_the_form_never_returns() {
        let mut h = harness();
        h.widget.activate();
        h.widget.set_draft("jane@example.com");
        h.widget.submit(PAGE);
        for _ in 0..2 {
            assert!(matches!(h.widget.activate(), Activation::OpenedChat(_)));
        }
        assert_eq!(h.chat.opened_with().len(), 3);
        assert_eq!(h.forwarder.sent.borrow().len(), 1);
    }

    #[test]
    fn outside_pointer_dismisses_without_side_effects() {
        let mut h = harness();
        h.widget.activate();
        h.widget.set_draft("jane@example.com");
        assert!(!h.widget.pointer_down(PointerTarget::Popover));
        assert!(!h.widget.pointer_down(PointerTarget::Control));
        assert_eq!(h.widget.state(), WidgetState::CapturingEmail);
        assert!(h.widget.pointer_down(PointerTarget::Outside));
        assert_eq!(h.widget.state(), WidgetState::Idle);
        assert!(h.store.get(DEFAULT_CONTACT_KEY).is_none());
        assert!(h.forwarder.sent.borrow().is_empty());
        assert!(h.chat.opened_with().is_empty());
    }

    #[test]
    fn reopening_clears_previous_draft_and_error() {
        let mut h = harness();
        h.widget.activate();
        h.widget.set_draft("oops");
        h.widget.submit(PAGE);
        h.widget.pointer_down(PointerTarget::Outside);
        h.widget.activate();
        assert_eq!(h.widget.view().draft, "");
        assert_eq!(h.widget.view().error, None);
    }

    #[test]
    fn events_outside_the_form_are_ignored() {
        let mut h = harness();
        h.widget.set_draft("jane@example.com");
        assert_eq!(h.widget.submit(PAGE), SubmitOutcome::Ignored);
        assert!(!h.widget.pointer_down(PointerTarget::Outside));
        assert_eq!(h.widget.view().draft, "");
    }

    #[test]
    fn storage_failures_are_swallowed_and_reported() {
        let chat = RecordingChat::loaded();
        let forwarder = RecordingForwarder::default();
        let diagnostics = RecordingDiagnostics::default();
        let mut widget = SupportWidget::new(BrokenStore, chat.clone(), forwarder.clone())
            .with_diagnostics(diagnostics.clone());

        assert_eq!(widget.activate(), Activation::ShowedForm);
        widget.set_draft("jane@example.com");
        assert!(matches!(widget.submit(PAGE), SubmitOutcome::Captured(_)));
        assert_eq!(chat.opened_with(), vec!["jane@example.com".to_string()]);
        assert_eq!(forwarder.sent.borrow().len(), 1);

        let kinds: Vec<_> = diagnostics.events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["storage_read", "storage_write"]);
    }

    #[test]
    fn unloaded_chat_is_a_silent_no_op() {
        let store = MemoryStore::with_entry(DEFAULT_CONTACT_KEY, "a@b.com");
        let chat = RecordingChat::default();
        let diagnostics = RecordingDiagnostics::default();
        let mut widget = SupportWidget::new(store, chat.clone(), RecordingForwarder::default())
            .with_diagnostics(diagnostics.clone());

        assert!(matches!(widget.activate(), Activation::OpenedChat(_)));
        assert_eq!(chat.opened_with(), vec!["a@b.com".to_string()]);
        assert_eq!(*chat.opened.borrow(), 0);
        assert_eq!(
            diagnostics.events(),
            vec![DiagnosticEvent::ChatUnavailable {
                reason: "chat integration not loaded".into()
            }]
        );
    }

    #[test]
    fn forward_dispatch_failure_does_not_block_chat() {
        struct Unreachable;
        impl ContactForwarder for Unreachable {
            fn forward(&self, _submission: FormSubmission) -> Result<(), ForwardError> {
                Err(ForwardError::NoRuntime)
            }
        }

        let store = MemoryStore::new();
        let chat = RecordingChat::loaded();
        let diagnostics = RecordingDiagnostics::default();
        let mut widget = SupportWidget::new(store.clone(), chat.clone(), Unreachable)
            .with_diagnostics(diagnostics.clone());
        widget.activate();
        widget.set_draft("jane@example.com");
        assert!(matches!(widget.submit(PAGE), SubmitOutcome::Captured(_)));
        assert_eq!(store.get(DEFAULT_CONTACT_KEY).as_deref(), Some("jane@example.com"));
        assert_eq!(*chat.opened.borrow(), 1);
        assert_eq!(diagnostics.events()[0].kind(), "forward_dispatch");
    }

    #[test]
    fn custom_key_and_page_name_are_used() {
        let store = MemoryStore::new();
        let forwarder = RecordingForwarder::default();
        let mut widget = SupportWidget::new(store.clone(), RecordingChat::loaded(), forwarder.clone())
            .with_contact_key("docs_email")
            .with_page_name("Docs")
            .with_diagnostics(crate::diagnostics::NullDiagnostics);
        widget.activate();
        widget.set_draft("a@b.io");
        widget.submit(PAGE);
        assert_eq!(store.get("docs_email").as_deref(), Some("a@b.io"));
        assert_eq!(forwarder.sent.borrow()[0].context.page_name, "Docs");
    }
}
