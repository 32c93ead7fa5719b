//! Small reusable rendering helpers.

pub mod level_bar;
pub mod time_fmt;
