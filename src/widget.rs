//! Types for creating and managing widgets.

use std::any::Any;
use std::fmt::{self, Debug, Display};
use std::sync::atomic::{self, AtomicBool, AtomicU64};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::layout::{Layout, WeakLayout};
use crate::widgets::Label;

/// Work performed after a widget has been clicked.
///
/// Click actions run after the widget's lock has been released, allowing
/// them to freely interact with the widget that produced them.
pub type ClickAction = Box<dyn FnOnce() + Send>;

/// A type that makes up a graphical user interface.
pub trait Widget: Send + Debug + 'static {
    /// Returns the text this widget displays.
    fn text(&self) -> &str;

    /// Returns true if this widget reacts to clicks.
    fn clickable(&self) -> bool {
        false
    }

    /// The widget has been clicked. `this` is the instance that contains this
    /// widget.
    fn click(&mut self, this: &WidgetInstance) -> Option<ClickAction> {
        let _ = this;
        None
    }

    /// The widget has been destroyed and will never be clicked again.
    ///
    /// Widgets should disconnect any events they own.
    fn destroyed(&mut self) {}
}

pub(crate) trait AnyWidget: Widget {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> AnyWidget for T
where
    T: Widget,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A type that can create a [`WidgetInstance`].
pub trait MakeWidget: Sized {
    /// Returns a new widget.
    fn make_widget(self) -> WidgetInstance;
}

impl<T> MakeWidget for T
where
    T: Widget,
{
    fn make_widget(self) -> WidgetInstance {
        WidgetInstance::new(self)
    }
}

impl MakeWidget for WidgetInstance {
    fn make_widget(self) -> WidgetInstance {
        self
    }
}

impl MakeWidget for &'_ str {
    fn make_widget(self) -> WidgetInstance {
        Label::new(self).make_widget()
    }
}

impl MakeWidget for String {
    fn make_widget(self) -> WidgetInstance {
        Label::new(self).make_widget()
    }
}

/// An instance of a [`Widget`].
///
/// This is the handle the rest of the crate passes around. Clones refer to
/// the same widget, and equality compares identity rather than contents.
#[derive(Clone)]
pub struct WidgetInstance {
    data: Arc<WidgetInstanceData>,
}

struct WidgetInstanceData {
    id: WidgetId,
    destroyed: AtomicBool,
    parent: Mutex<Option<WeakLayout>>,
    widget: Box<Mutex<dyn AnyWidget>>,
}

impl WidgetInstance {
    /// Returns a new instance containing `widget`.
    pub fn new<W>(widget: W) -> Self
    where
        W: Widget,
    {
        Self {
            data: Arc::new(WidgetInstanceData {
                id: WidgetId::unique(),
                destroyed: AtomicBool::new(false),
                parent: Mutex::new(None),
                widget: Box::new(Mutex::new(widget)),
            }),
        }
    }

    /// Returns the unique id of this widget instance.
    #[must_use]
    pub fn id(&self) -> WidgetId {
        self.data.id
    }

    /// Returns the text this widget displays.
    #[must_use]
    pub fn text(&self) -> String {
        self.lock().text().to_string()
    }

    /// Returns true if this widget reacts to clicks.
    #[must_use]
    pub fn is_clickable(&self) -> bool {
        !self.is_destroyed() && self.lock().clickable()
    }

    /// Clicks this widget, returning true if the click produced an action.
    ///
    /// Destroyed widgets ignore clicks.
    pub fn click(&self) -> bool {
        if self.is_destroyed() {
            debug!(id = %self.id(), "ignoring click on destroyed widget");
            return false;
        }

        let action = self.lock().click(self);
        if let Some(action) = action {
            action();
            true
        } else {
            false
        }
    }

    /// Returns true if [`destroy()`](Self::destroy) has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.data.destroyed.load(atomic::Ordering::Acquire)
    }

    /// Detaches this widget from its parent and disconnects everything it
    /// owns.
    ///
    /// Returns false if the widget was already destroyed.
    pub fn destroy(&self) -> bool {
        if self.data.destroyed.swap(true, atomic::Ordering::AcqRel) {
            return false;
        }

        self.detach_from_parent();
        self.lock().destroyed();
        debug!(id = %self.id(), "widget destroyed");
        true
    }

    /// Returns the layout this widget is attached to, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Layout> {
        self.data
            .parent
            .lock()
            .as_ref()
            .and_then(WeakLayout::upgrade)
    }

    /// Removes this widget from the layout it is attached to.
    ///
    /// Returns true if the widget had a parent.
    pub fn detach_from_parent(&self) -> bool {
        let parent = self.data.parent.lock().take();
        match parent.and_then(|parent| parent.upgrade()) {
            Some(layout) => {
                layout.remove_item(self.id());
                true
            }
            None => false,
        }
    }

    /// Locks the widget for exclusive access. Locking widgets should only be
    /// done for brief moments of time when you are certain no deadlocks can
    /// occur due to other widget locks being held.
    #[must_use]
    pub fn lock(&self) -> WidgetGuard<'_> {
        WidgetGuard(self.data.widget.lock())
    }

    /// Sets `parent` as this widget's parent if it has none.
    pub(crate) fn claim_parent(&self, parent: WeakLayout) -> bool {
        let mut current = self.data.parent.lock();
        if current.is_some() {
            false
        } else {
            *current = Some(parent);
            true
        }
    }

    /// Clears this widget's parent if it is `layout`.
    pub(crate) fn release_parent(&self, layout: &Layout) {
        let mut current = self.data.parent.lock();
        if current
            .as_ref()
            .is_some_and(|parent| parent.points_to(layout))
        {
            *current = None;
        }
    }
}

impl Debug for WidgetInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("WidgetInstance");
        debug
            .field("id", &self.data.id)
            .field("destroyed", &self.is_destroyed());
        if let Some(widget) = self.data.widget.try_lock() {
            debug.field("widget", &&*widget);
        }
        debug.finish_non_exhaustive()
    }
}

impl AsRef<WidgetId> for WidgetInstance {
    fn as_ref(&self) -> &WidgetId {
        &self.data.id
    }
}

impl Eq for WidgetInstance {}

impl PartialEq for WidgetInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Exclusive access to a widget.
pub struct WidgetGuard<'a>(MutexGuard<'a, dyn AnyWidget>);

impl WidgetGuard<'_> {
    /// Returns a reference to `T` if it is the type contained.
    #[must_use]
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: 'static,
    {
        self.0.as_any().downcast_ref()
    }

    /// Returns an exclusive reference to `T` if it is the type contained.
    #[must_use]
    pub fn downcast_mut<T>(&mut self) -> Option<&mut T>
    where
        T: 'static,
    {
        self.0.as_any_mut().downcast_mut()
    }

    fn text(&self) -> &str {
        self.0.text()
    }

    fn clickable(&self) -> bool {
        self.0.clickable()
    }

    fn click(&mut self, this: &WidgetInstance) -> Option<ClickAction> {
        self.0.click(this)
    }

    fn destroyed(&mut self) {
        self.0.destroyed();
    }
}

/// The unique id of a [`WidgetInstance`].
///
/// Each [`WidgetInstance`] is guaranteed to have a unique [`WidgetId`] across
/// the lifetime of an application.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Ord, PartialOrd)]
pub struct WidgetId(u64);

impl WidgetId {
    fn unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, atomic::Ordering::Acquire))
    }
}

impl Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
