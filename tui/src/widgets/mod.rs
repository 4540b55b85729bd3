//! Widgets

pub mod text_block;

pub use text_block::{Anchor, StyledLine, TextBlock, TextBlockState};
