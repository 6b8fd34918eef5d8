//! Modal message boxes.

use std::fmt::Debug;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::event::{CallbackDisconnected, CallbackHandle, Event};

/// How severe a [`MessageBox`] is.
#[derive(Default, Clone, Eq, PartialEq, Copy, Debug)]
pub enum MessageLevel {
    /// An error message.
    Error,
    /// A warning message.
    Warning,
    /// An informational message.
    #[default]
    Info,
}

/// A message shown to the user.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[must_use]
pub struct MessageBox {
    text: String,
    explanation: String,
    level: MessageLevel,
}

impl MessageBox {
    /// Returns an informational message displaying `text`.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Sets the explanation text and returns self.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Displays this message as a warning.
    pub fn warning(mut self) -> Self {
        self.level = MessageLevel::Warning;
        self
    }

    /// Displays this message as an error.
    pub fn error(mut self) -> Self {
        self.level = MessageLevel::Error;
        self
    }

    /// Returns the main text of this message.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the explanation shown beneath the main text.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Returns the level of this message.
    #[must_use]
    pub const fn level(&self) -> MessageLevel {
        self.level
    }
}

/// A frontend capable of showing a [`MessageBox`] modally.
pub trait DialogPresenter: Send + Sync + 'static {
    /// Shows `message` and blocks the calling thread until the user dismisses
    /// it.
    fn present(&self, message: &MessageBox);
}

/// Shows a modal message each time it is asked to.
#[derive(Clone)]
pub struct MessageTrigger {
    data: Arc<MessageTriggerData>,
}

struct MessageTriggerData {
    message: Mutex<MessageBox>,
    presenter: Arc<dyn DialogPresenter>,
}

impl MessageTrigger {
    /// Returns a trigger that shows its messages using `presenter`.
    #[must_use]
    pub fn new(presenter: Arc<dyn DialogPresenter>) -> Self {
        Self::with_message(MessageBox::default(), presenter)
    }

    /// Returns a trigger that shows `message`, with its text replaced on each
    /// [`show()`](Self::show), using `presenter`.
    #[must_use]
    pub fn with_message(message: MessageBox, presenter: Arc<dyn DialogPresenter>) -> Self {
        Self {
            data: Arc::new(MessageTriggerData {
                message: Mutex::new(message),
                presenter,
            }),
        }
    }

    /// Sets the message text to `text` and shows it, blocking until the
    /// message is dismissed.
    pub fn show(&self, text: &str) {
        let message = {
            let mut message = self.data.message.lock();
            message.text = text.to_string();
            message.clone()
        };
        debug!(text, "showing message");
        self.data.presenter.present(&message);
    }

    /// Returns the message most recently shown.
    pub fn message(&self) -> MessageBox {
        self.data.message.lock().clone()
    }

    /// Shows each label `event` emits.
    ///
    /// The connection does not keep this trigger alive.
    pub fn connect(&self, event: &Event<String>) -> CallbackHandle {
        let data = Arc::downgrade(&self.data);
        event.subscribe_try(move |text| {
            let trigger = Self::upgrade(&data).ok_or(CallbackDisconnected)?;
            trigger.show(&text);
            Ok(())
        })
    }

    fn upgrade(data: &Weak<MessageTriggerData>) -> Option<Self> {
        data.upgrade().map(|data| Self { data })
    }
}

impl Debug for MessageTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageTrigger")
            .field("message", &*self.data.message.lock())
            .finish_non_exhaustive()
    }
}
