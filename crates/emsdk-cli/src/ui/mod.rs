//! Terminal output: theme, the reporter the core library talks to, and the
//! `list` table.

pub mod list;
pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
