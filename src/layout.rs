//! Ordered containers of widgets.

use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::widget::{MakeWidget, WidgetId, WidgetInstance};

/// The direction a [`Layout`] arranges its items in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Orientation {
    /// Items are stacked vertically.
    Rows,
    /// Items are placed side by side horizontally.
    Columns,
}

/// An entry in a [`Layout`].
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    /// A widget.
    Widget(WidgetInstance),
    /// Flexible empty space that absorbs any extra room.
    Stretch,
    /// A nested layout.
    Layout(Layout),
}

/// An error arising from adding a widget to a [`Layout`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// The widget already belongs to a layout.
    #[error("widget {0} is already attached to a layout")]
    AlreadyAttached(WidgetId),
    /// The widget has been destroyed and can no longer be shown.
    #[error("widget {0} has been destroyed")]
    Destroyed(WidgetId),
}

/// An ordered, shared list of widgets, spacers and nested layouts.
///
/// Cloning a layout produces another handle to the same list. A widget may
/// only be attached to one layout at a time, and appears in it at most once.
#[derive(Clone)]
pub struct Layout {
    data: Arc<LayoutData>,
}

struct LayoutData {
    orientation: Orientation,
    items: Mutex<Vec<LayoutItem>>,
}

impl Layout {
    /// Returns an empty layout arranged in `orientation`.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self {
            data: Arc::new(LayoutData {
                orientation,
                items: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns an empty vertical layout.
    #[must_use]
    pub fn rows() -> Self {
        Self::new(Orientation::Rows)
    }

    /// Returns an empty horizontal layout.
    #[must_use]
    pub fn columns() -> Self {
        Self::new(Orientation::Columns)
    }

    /// Returns the direction this layout arranges its items in.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.data.orientation
    }

    /// Adds `widget` to the end of this layout, returning its instance.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::Destroyed`]: the widget has been destroyed.
    /// - [`LayoutError::AlreadyAttached`]: the widget is already in a layout.
    pub fn append(&self, widget: impl MakeWidget) -> Result<WidgetInstance, LayoutError> {
        let widget = widget.make_widget();
        if widget.is_destroyed() {
            return Err(LayoutError::Destroyed(widget.id()));
        }
        if !widget.claim_parent(self.downgrade()) {
            return Err(LayoutError::AlreadyAttached(widget.id()));
        }

        self.data
            .items
            .lock()
            .push(LayoutItem::Widget(widget.clone()));
        debug!(id = %widget.id(), "widget attached");
        Ok(widget)
    }

    /// Adds flexible space to the end of this layout.
    pub fn add_stretch(&self) {
        self.data.items.lock().push(LayoutItem::Stretch);
    }

    /// Adds `layout` as a nested layout at the end of this layout.
    pub fn add_layout(&self, layout: Layout) {
        self.data.items.lock().push(LayoutItem::Layout(layout));
    }

    /// Removes `widget` from this layout, returning true if it was present.
    ///
    /// Removing a widget that is not a direct child of this layout does
    /// nothing.
    pub fn remove(&self, widget: &WidgetInstance) -> bool {
        if self.remove_item(widget.id()) {
            widget.release_parent(self);
            true
        } else {
            false
        }
    }

    pub(crate) fn remove_item(&self, id: WidgetId) -> bool {
        let mut items = self.data.items.lock();
        let Some(index) = items
            .iter()
            .position(|item| matches!(item, LayoutItem::Widget(widget) if widget.id() == id))
        else {
            return false;
        };
        items.remove(index);
        drop(items);
        debug!(id = %id, "widget removed from layout");
        true
    }

    /// Returns true if `widget` is a direct child of this layout.
    #[must_use]
    pub fn contains(&self, widget: &WidgetInstance) -> bool {
        self.position(widget).is_some()
    }

    /// Returns the index of `widget` among this layout's direct child
    /// widgets.
    #[must_use]
    pub fn position(&self, widget: &WidgetInstance) -> Option<usize> {
        self.widgets().iter().position(|child| child == widget)
    }

    /// Returns a snapshot of this layout's items.
    #[must_use]
    pub fn items(&self) -> Vec<LayoutItem> {
        self.data.items.lock().clone()
    }

    /// Returns a snapshot of the widgets that are direct children of this
    /// layout, in order.
    #[must_use]
    pub fn widgets(&self) -> Vec<WidgetInstance> {
        self.data
            .items
            .lock()
            .iter()
            .filter_map(|item| match item {
                LayoutItem::Widget(widget) => Some(widget.clone()),
                LayoutItem::Stretch | LayoutItem::Layout(_) => None,
            })
            .collect()
    }

    /// Returns the text of each direct child widget, in order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.widgets().iter().map(WidgetInstance::text).collect()
    }

    /// Returns the number of widgets that are direct children of this layout.
    #[must_use]
    pub fn widget_count(&self) -> usize {
        self.data
            .items
            .lock()
            .iter()
            .filter(|item| matches!(item, LayoutItem::Widget(_)))
            .count()
    }

    /// Returns true if this layout has no items at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.items.lock().is_empty()
    }

    /// Returns every widget in this layout and its nested layouts, depth
    /// first.
    #[must_use]
    pub fn all_widgets(&self) -> Vec<WidgetInstance> {
        let mut widgets = Vec::new();
        self.collect_widgets(&mut widgets);
        widgets
    }

    fn collect_widgets(&self, widgets: &mut Vec<WidgetInstance>) {
        for item in self.items() {
            match item {
                LayoutItem::Widget(widget) => widgets.push(widget),
                LayoutItem::Layout(layout) => layout.collect_widgets(widgets),
                LayoutItem::Stretch => {}
            }
        }
    }

    pub(crate) fn downgrade(&self) -> WeakLayout {
        WeakLayout(Arc::downgrade(&self.data))
    }
}

impl Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("orientation", &self.data.orientation)
            .field("items", &self.data.items.try_lock().map(|items| items.len()))
            .finish()
    }
}

impl Eq for Layout {}

impl PartialEq for Layout {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// A non-owning reference to a [`Layout`].
#[derive(Clone)]
pub(crate) struct WeakLayout(Weak<LayoutData>);

impl WeakLayout {
    pub(crate) fn upgrade(&self) -> Option<Layout> {
        self.0.upgrade().map(|data| Layout { data })
    }

    pub(crate) fn points_to(&self, layout: &Layout) -> bool {
        Weak::as_ptr(&self.0) == Arc::as_ptr(&layout.data)
    }
}

#[cfg(test)]
mod tests {
    use super::{Layout, LayoutError, LayoutItem, Orientation};
    use crate::widget::MakeWidget;

    #[test]
    fn append_preserves_order() {
        let layout = Layout::columns();
        layout.append("a").expect("fresh widget");
        layout.append("b").expect("fresh widget");
        layout.append("c").expect("fresh widget");

        assert_eq!(layout.orientation(), Orientation::Columns);
        assert_eq!(layout.labels(), ["a", "b", "c"]);
        assert_eq!(layout.widget_count(), 3);
    }

    #[test]
    fn widgets_are_never_present_twice() {
        let layout = Layout::rows();
        let widget = layout.append("a").expect("fresh widget");
        assert_eq!(
            layout.append(widget.clone()),
            Err(LayoutError::AlreadyAttached(widget.id()))
        );

        let other = Layout::rows();
        assert_eq!(
            other.append(widget.clone()),
            Err(LayoutError::AlreadyAttached(widget.id()))
        );
        assert_eq!(layout.widget_count(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn destroyed_widgets_cannot_be_attached() {
        let widget = "gone".make_widget();
        widget.destroy();
        assert_eq!(
            Layout::rows().append(widget.clone()),
            Err(LayoutError::Destroyed(widget.id()))
        );
    }

    #[test]
    fn remove_by_identity() {
        let layout = Layout::columns();
        let first = layout.append("x").expect("fresh widget");
        let second = layout.append("x").expect("fresh widget");
        let third = layout.append("y").expect("fresh widget");

        assert!(layout.remove(&second));
        assert_eq!(layout.widgets(), [first.clone(), third.clone()]);
        assert_eq!(second.parent(), None);
        assert_eq!(first.parent(), Some(layout.clone()));

        assert!(!layout.remove(&second));
        assert_eq!(layout.widget_count(), 2);
    }

    #[test]
    fn removing_unknown_widget_is_ignored() {
        let layout = Layout::rows();
        layout.append("a").expect("fresh widget");
        let stranger = "stranger".make_widget();

        assert!(!layout.remove(&stranger));
        assert_eq!(layout.labels(), ["a"]);
    }

    #[test]
    fn detached_widgets_can_be_reattached() {
        let first = Layout::rows();
        let second = Layout::rows();
        let widget = first.append("moving").expect("fresh widget");

        assert!(widget.detach_from_parent());
        assert!(!widget.detach_from_parent());
        assert!(first.is_empty());

        second.append(widget.clone()).expect("detached widget");
        assert_eq!(widget.parent(), Some(second.clone()));
    }

    #[test]
    fn nested_layouts() {
        let outer = Layout::rows();
        let inner = Layout::columns();
        outer.add_stretch();
        outer.add_layout(inner.clone());
        outer.append("outer").expect("fresh widget");
        inner.append("inner").expect("fresh widget");

        assert_eq!(outer.widget_count(), 1);
        assert!(matches!(outer.items()[0], LayoutItem::Stretch));
        let all = outer
            .all_widgets()
            .iter()
            .map(|widget| widget.text())
            .collect::<Vec<_>>();
        assert_eq!(all, ["inner", "outer"]);
    }
}
