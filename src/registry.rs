//! Creating and removing buttons in response to events.

use std::sync::{Arc, Weak};

use kempt::Map;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::event::{CallbackDisconnected, CallbackHandle, Event};
use crate::layout::Layout;
use crate::widget::{WidgetId, WidgetInstance};
use crate::widgets::Button;

/// An error returned by [`WidgetRegistry::try_remove()`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// The widget is not managed by this registry.
    #[error("widget {0} is not managed by this registry")]
    UnknownWidget(WidgetId),
}

/// Adds deletable buttons to a [`Layout`] on request, and removes each one
/// when it is clicked.
///
/// Every widget the registry adds is subscribed to exactly once. When a
/// widget asks to be removed, the registry drops that subscription, removes
/// the widget from the layout and destroys it. The registry keeps no handle to
/// a widget after it has been removed.
#[derive(Clone, Debug)]
pub struct WidgetRegistry {
    data: Arc<RegistryData>,
}

#[derive(Debug)]
struct RegistryData {
    layout: Layout,
    subscriptions: Mutex<Map<WidgetId, CallbackHandle>>,
}

impl WidgetRegistry {
    /// Returns a registry that manages widgets in `layout`.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            data: Arc::new(RegistryData {
                layout,
                subscriptions: Mutex::new(Map::new()),
            }),
        }
    }

    /// Returns the layout this registry adds widgets to.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.data.layout
    }

    /// Creates a deletable button labeled `label` and appends it to the end of
    /// the layout, returning the new widget.
    pub fn on_create(&self, label: &str) -> WidgetInstance {
        let (widget, removed) = Button::deletable(label);
        let registry = Arc::downgrade(&self.data);
        let subscription = removed.subscribe_try(move |widget| {
            let registry = WidgetRegistry::upgrade(&registry).ok_or(CallbackDisconnected)?;
            registry.on_remove(&widget);
            Ok(())
        });
        self.data
            .subscriptions
            .lock()
            .insert(widget.id(), subscription);

        if let Err(err) = self.data.layout.append(widget.clone()) {
            error!(%err, "unable to add created widget");
            self.data.subscriptions.lock().remove(&widget.id());
            return widget;
        }

        debug!(id = %widget.id(), label, "created widget");
        widget
    }

    /// Removes `widget` from the layout and destroys it.
    ///
    /// Widgets this registry does not manage, including widgets it has
    /// already removed, are ignored and false is returned.
    pub fn on_remove(&self, widget: &WidgetInstance) -> bool {
        match self.try_remove(widget) {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "ignoring removal request");
                false
            }
        }
    }

    /// Removes `widget` from the layout and destroys it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownWidget`] if `widget` is not currently
    /// managed by this registry.
    pub fn try_remove(&self, widget: &WidgetInstance) -> Result<(), RegistryError> {
        let subscription = self
            .data
            .subscriptions
            .lock()
            .remove(&widget.id())
            .map(|field| field.value);
        let Some(subscription) = subscription else {
            return Err(RegistryError::UnknownWidget(widget.id()));
        };
        drop(subscription);

        self.data.layout.remove(widget);
        widget.destroy();
        debug!(id = %widget.id(), "removed widget");
        Ok(())
    }

    /// Calls [`on_create()`](Self::on_create) each time `created` fires.
    ///
    /// The connection does not keep this registry alive.
    pub fn connect(&self, created: &Event<String>) -> CallbackHandle {
        let registry = Arc::downgrade(&self.data);
        created.subscribe_try(move |label| {
            let registry = WidgetRegistry::upgrade(&registry).ok_or(CallbackDisconnected)?;
            registry.on_create(&label);
            Ok(())
        })
    }

    /// Returns true if `widget` is currently managed by this registry.
    #[must_use]
    pub fn manages(&self, widget: &WidgetInstance) -> bool {
        self.data.subscriptions.lock().contains(&widget.id())
    }

    /// Returns the number of widgets currently managed by this registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.subscriptions.lock().len()
    }

    /// Returns true if this registry manages no widgets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn upgrade(data: &Weak<RegistryData>) -> Option<Self> {
        data.upgrade().map(|data| Self { data })
    }
}

#[cfg(test)]
mod tests {
    use super::{RegistryError, WidgetRegistry};
    use crate::layout::Layout;
    use crate::widget::{MakeWidget, WidgetInstance};
    use crate::widgets::Button;

    fn registry() -> WidgetRegistry {
        WidgetRegistry::new(Layout::columns())
    }

    #[test]
    fn create_appends_one_widget() {
        let registry = registry();
        for (count, label) in ["Push me!", "", "No, push me!", "ünïcödé"].iter().enumerate() {
            let widget = registry.on_create(label);
            assert_eq!(registry.layout().widget_count(), count + 1);
            assert_eq!(widget.text(), *label);
            assert_eq!(registry.layout().widgets().last(), Some(&widget));
        }
    }

    #[test]
    fn clicking_a_created_widget_removes_it() {
        let registry = registry();
        let a = registry.on_create("A");
        let b = registry.on_create("B");
        let c = registry.on_create("C");

        assert!(b.click());
        assert_eq!(registry.layout().widgets(), [a.clone(), c.clone()]);
        assert!(b.is_destroyed());
        assert_eq!(b.parent(), None);
        assert!(!registry.manages(&b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn create_then_remove_scenario() {
        let registry = registry();
        let a = registry.on_create("A");
        let b = registry.on_create("B");
        assert_eq!(registry.layout().labels(), ["A", "B"]);

        a.click();
        assert_eq!(registry.layout().labels(), ["B"]);

        b.click();
        assert!(registry.layout().labels().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn identity_not_label_is_the_removal_key() {
        let registry = registry();
        let first = registry.on_create("X");
        let second = registry.on_create("X");
        assert_ne!(first, second);
        assert_eq!(registry.layout().labels(), ["X", "X"]);

        second.click();
        assert_eq!(registry.layout().widgets(), [first.clone()]);
    }

    #[test]
    fn unknown_widgets_are_ignored() {
        let registry = registry();
        registry.on_create("A");
        let before = registry.layout().widgets();

        let stranger = "stranger".make_widget();
        assert!(!registry.on_remove(&stranger));
        assert_eq!(
            registry.try_remove(&stranger),
            Err(RegistryError::UnknownWidget(stranger.id()))
        );
        assert!(!stranger.is_destroyed());
        assert_eq!(registry.layout().widgets(), before);
    }

    #[test]
    fn removing_twice_is_ignored() {
        let registry = registry();
        let widget = registry.on_create("once");
        assert!(registry.on_remove(&widget));
        assert!(!registry.on_remove(&widget));
        assert_eq!(
            registry.try_remove(&widget),
            Err(RegistryError::UnknownWidget(widget.id()))
        );
    }

    #[test]
    fn removed_widgets_never_fire_again() {
        let registry = registry();
        let keep = registry.on_create("keep");
        let widget = registry.on_create("gone");

        widget.click();
        assert!(!widget.click());
        assert_eq!(registry.layout().widgets(), [keep.clone()]);
        assert!(!widget.is_clickable());
    }

    #[test]
    fn connected_triggers_create_widgets() {
        let registry = registry();
        let (push, pushed) = Button::trigger("Push me!");
        let (no, noed) = Button::trigger("No, push me!");
        let _connections = registry.connect(&pushed) + registry.connect(&noed);

        push.click();
        no.click();
        push.click();
        assert_eq!(
            registry.layout().labels(),
            ["Push me!", "No, push me!", "Push me!"]
        );
    }

    #[test]
    fn connections_do_not_keep_the_registry_alive() {
        let layout = Layout::columns();
        let registry = WidgetRegistry::new(layout.clone());
        let (push, pushed) = Button::trigger("Push me!");
        let connection = registry.connect(&pushed);
        let created: WidgetInstance = registry.on_create("created");
        drop(registry);

        push.click();
        assert_eq!(layout.widgets(), [created.clone()]);
        assert!(!connection.is_connected());

        // The registry is gone, so nothing removes the widget.
        created.click();
        assert_eq!(layout.widgets(), [created]);
    }
}
