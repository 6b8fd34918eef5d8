//! Top-level windows.

use std::fmt::Write as _;

use crate::layout::{Layout, LayoutItem, Orientation};
use crate::widget::WidgetInstance;

/// The position and size of a window, in screen pixels.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Geometry {
    /// Horizontal position of the window's top-left corner.
    pub x: i32,
    /// Vertical position of the window's top-left corner.
    pub y: i32,
    /// Width of the window.
    pub width: u32,
    /// Height of the window.
    pub height: u32,
}

impl Geometry {
    /// Returns a geometry at `x, y` with the given size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(200, 200, 600, 600)
    }
}

/// A titled window whose contents are a [`Layout`].
#[derive(Debug, Clone)]
#[must_use]
pub struct Window {
    title: String,
    geometry: Geometry,
    root: Layout,
}

impl Window {
    /// Returns a window displaying `root`.
    pub fn new(root: Layout) -> Self {
        Self {
            title: String::from("My window"),
            geometry: Geometry::default(),
            root,
        }
    }

    /// Sets the window's title and returns self.
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the window's position and size and returns self.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Returns the window's title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the window's position and size.
    #[must_use]
    pub const fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Returns the layout displayed in this window.
    #[must_use]
    pub const fn root(&self) -> &Layout {
        &self.root
    }

    /// Returns every widget that reacts to clicks, in display order.
    #[must_use]
    pub fn clickable_widgets(&self) -> Vec<WidgetInstance> {
        self.root
            .all_widgets()
            .into_iter()
            .filter(WidgetInstance::is_clickable)
            .collect()
    }

    /// Returns the first clickable widget displaying `text`.
    #[must_use]
    pub fn find_clickable(&self, text: &str) -> Option<WidgetInstance> {
        self.clickable_widgets()
            .into_iter()
            .find(|widget| widget.text() == text)
    }

    /// Renders the window as indented text.
    ///
    /// Clickable widgets are numbered, starting at 1, in the same order
    /// [`clickable_widgets()`](Self::clickable_widgets) returns them.
    #[must_use]
    pub fn render(&self) -> String {
        let Geometry {
            x,
            y,
            width,
            height,
        } = self.geometry;
        let mut output = format!("== {} ({width}x{height} at {x},{y}) ==\n", self.title);
        let mut next_number = 1;
        render_layout(&self.root, 0, &mut next_number, &mut output);
        output
    }
}

fn render_layout(layout: &Layout, depth: usize, next_number: &mut usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    let kind = match layout.orientation() {
        Orientation::Rows => "rows",
        Orientation::Columns => "columns",
    };
    let _ = writeln!(output, "{indent}{kind}");
    let indent = "  ".repeat(depth + 1);
    for item in layout.items() {
        match item {
            LayoutItem::Widget(widget) => {
                if widget.is_clickable() {
                    let _ = writeln!(output, "{indent}[{next_number}] {}", widget.text());
                    *next_number += 1;
                } else {
                    let _ = writeln!(output, "{indent}{}", widget.text());
                }
            }
            LayoutItem::Stretch => {
                let _ = writeln!(output, "{indent}~");
            }
            LayoutItem::Layout(nested) => render_layout(&nested, depth + 1, next_number, output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, Window};
    use crate::layout::Layout;
    use crate::widgets::Button;

    #[test]
    fn render_numbers_clickable_widgets() {
        let root = Layout::rows();
        let row = Layout::columns();
        root.add_stretch();
        root.append("Title").expect("fresh widget");
        root.add_layout(row.clone());
        row.append(Button::new("One")).expect("fresh widget");
        row.append(Button::new("Two")).expect("fresh widget");

        let window = Window::new(root)
            .titled("Test")
            .with_geometry(Geometry::new(1, 2, 30, 40));
        assert_eq!(
            window.render(),
            "== Test (30x40 at 1,2) ==\nrows\n  ~\n  Title\n  columns\n    [1] One\n    [2] Two\n"
        );
        let clickable = window
            .clickable_widgets()
            .iter()
            .map(|widget| widget.text())
            .collect::<Vec<_>>();
        assert_eq!(clickable, ["One", "Two"]);
        assert!(window.find_clickable("Two").is_some());
        assert!(window.find_clickable("Title").is_none());
    }

    #[test]
    fn defaults() {
        let window = Window::new(Layout::rows());
        assert_eq!(window.title(), "My window");
        assert_eq!(window.geometry(), Geometry::new(200, 200, 600, 600));
    }
}
