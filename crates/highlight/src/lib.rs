//! Marking newly arrived comments and clearing the marks again.
//!
//! A [`CommentHighlighter`] injects the style sheet for the page's layout,
//! adds the marker and transition classes to a comment, and on click removes
//! them in two phases: the marker immediately, the transition class once the
//! configured transition has run.

mod controller;
mod options;
mod style;
pub mod stylesheet;

pub use crate::controller::{CommentHighlighter, HighlighterError, clear_set, teardown_all};
pub use crate::options::{HighlighterOptions, OptionsError};
pub use crate::style::{AlternateStyles, ClassicStyles, StyleError, StyleInjector, injector_for};
