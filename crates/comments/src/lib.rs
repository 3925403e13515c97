//! Incremental mirror of a live comment tree.
//!
//! [`CommentThread`] discovers every comment element under a thread's listing,
//! wraps each in a stable-identity [`CommentNode`], and keeps extending that set
//! as the page inserts more comments. Page adapters ([`ClassicPage`]) create the
//! thread and announce it through a [`ThreadOpenNotifier`].

mod error;
mod layout;
mod node;
mod notifier;
mod page;
pub mod page_mode;
mod thread;

pub use crate::error::CommentError;
pub use crate::layout::ThreadLayout;
pub use crate::node::{CommentNode, read_identity};
pub use crate::notifier::ThreadOpenNotifier;
pub use crate::page::{ClassicPage, Page, detect_page};
pub use crate::thread::CommentThread;
