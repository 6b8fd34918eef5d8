//! Built-in [`Widget`](crate::widget::Widget) implementations.

pub mod button;
mod label;

pub use button::Button;
pub use label::Label;
