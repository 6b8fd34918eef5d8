use crate::widget::Widget;

/// A read-only text widget.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Label {
    /// The text displayed.
    pub contents: String,
}

impl Label {
    /// Returns a label displaying `contents`.
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
        }
    }
}

impl Widget for Label {
    fn text(&self) -> &str {
        &self.contents
    }
}
