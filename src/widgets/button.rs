//! A clickable, labeled button
use crate::event::Event;
use crate::widget::{ClickAction, MakeWidget, Widget, WidgetInstance};

/// A clickable button.
///
/// Every button fires [`Button::clicked()`] when clicked. Buttons created
/// with [`Button::trigger()`] or [`Button::deletable()`] also fire a second
/// event carrying their label or their own handle.
#[derive(Debug)]
pub struct Button {
    label: String,
    clicked: Event<()>,
    emits: Emits,
}

#[derive(Debug)]
enum Emits {
    Nothing,
    Label(Event<String>),
    Itself(Event<WidgetInstance>),
}

impl Button {
    /// Returns a new button with the provided label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            clicked: Event::new(),
            emits: Emits::Nothing,
        }
    }

    /// Returns a button displaying `label` and an event that receives `label`
    /// each time the button is clicked.
    pub fn trigger(label: impl Into<String>) -> (WidgetInstance, Event<String>) {
        let created = Event::new();
        let button = Self {
            emits: Emits::Label(created.clone()),
            ..Self::new(label)
        };
        (button.make_widget(), created)
    }

    /// Returns a button displaying `label` and an event that receives the
    /// button's own [`WidgetInstance`] each time it is clicked.
    pub fn deletable(label: impl Into<String>) -> (WidgetInstance, Event<WidgetInstance>) {
        let removed = Event::new();
        let button = Self {
            emits: Emits::Itself(removed.clone()),
            ..Self::new(label)
        };
        (button.make_widget(), removed)
    }

    /// Invokes `on_click` each time the button is clicked, for as long as the
    /// button exists, and returns self.
    #[must_use]
    pub fn on_click<F>(self, mut on_click: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.clicked.subscribe(move |()| on_click()).persist();
        self
    }

    /// Returns the event fired each time this button is clicked.
    #[must_use]
    pub const fn clicked(&self) -> &Event<()> {
        &self.clicked
    }

    /// Returns the label displayed on this button.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Widget for Button {
    fn text(&self) -> &str {
        &self.label
    }

    fn clickable(&self) -> bool {
        true
    }

    fn click(&mut self, this: &WidgetInstance) -> Option<ClickAction> {
        let clicked = self.clicked.clone();
        let emit: ClickAction = match &self.emits {
            Emits::Nothing => Box::new(|| {}),
            Emits::Label(created) => {
                let created = created.clone();
                let label = self.label.clone();
                Box::new(move || {
                    created.emit(label);
                })
            }
            Emits::Itself(removed) => {
                let removed = removed.clone();
                let this = this.clone();
                Box::new(move || {
                    removed.emit(this);
                })
            }
        };

        Some(Box::new(move || {
            clicked.emit(());
            emit();
        }))
    }

    fn destroyed(&mut self) {
        self.clicked.disconnect_all();
        match &self.emits {
            Emits::Nothing => {}
            Emits::Label(created) => created.disconnect_all(),
            Emits::Itself(removed) => removed.disconnect_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::Button;
    use crate::widget::MakeWidget;

    #[test]
    fn trigger_repeats_its_label() {
        let (widget, created) = Button::trigger("Push me!");
        let labels = Arc::new(Mutex::new(Vec::new()));
        let _handle = created.subscribe({
            let labels = labels.clone();
            move |label| labels.lock().push(label)
        });

        assert_eq!(widget.text(), "Push me!");
        assert!(widget.is_clickable());
        for _ in 0..3 {
            assert!(widget.click());
        }
        assert_eq!(*labels.lock(), ["Push me!", "Push me!", "Push me!"]);
    }

    #[test]
    fn deletable_emits_itself() {
        let (first, first_removed) = Button::deletable("X");
        let (second, _second_removed) = Button::deletable("X");
        let emitted = Arc::new(Mutex::new(Vec::new()));
        let _handle = first_removed.subscribe({
            let emitted = emitted.clone();
            move |widget| emitted.lock().push(widget)
        });

        first.click();
        second.click();
        assert_eq!(*emitted.lock(), [first.clone()]);
    }

    #[test]
    fn on_click_runs_every_click() {
        let count = Arc::new(Mutex::new(0));
        let widget = Button::new("GET")
            .on_click({
                let count = count.clone();
                move || *count.lock() += 1
            })
            .make_widget();

        widget.click();
        widget.click();
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn destroyed_buttons_disconnect() {
        let (widget, removed) = Button::deletable("bye");
        let fired = Arc::new(Mutex::new(0));
        let _handle = removed.subscribe({
            let fired = fired.clone();
            move |_| *fired.lock() += 1
        });
        assert_eq!(removed.subscriber_count(), 1);

        widget.destroy();
        assert_eq!(removed.subscriber_count(), 0);
        assert!(!widget.is_clickable());
        assert!(!widget.click());
        assert_eq!(removed.emit(widget.clone()), 0);
        assert_eq!(*fired.lock(), 0);
    }
}
