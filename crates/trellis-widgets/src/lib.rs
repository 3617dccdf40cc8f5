//! Concrete widgets and tree-building helpers on top of `trellis-core`.

mod builders;
mod button;
mod fill;
mod label;

pub use builders::{column, layers, row};
pub use button::Button;
pub use fill::Fill;
pub use label::{Label, MonoMeasure, TextMeasure};
