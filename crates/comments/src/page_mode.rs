//! Pure predicates describing what kind of page is loaded.

use core_types::{PageVariant, ThreadId};
use dom::Document;
use platform::Window;
use url::Url;

/// Id of the root container the alternate (redesign) layout renders into.
pub const ALTERNATE_ROOT_ID: &str = "2x-container";

/// Thread id from a `/r/<sub>/comments/<id>/...` address.
pub fn thread_id(url: &Url) -> Option<ThreadId> {
    let mut segments = url.path_segments()?;
    if segments.next()? != "r" {
        return None;
    }
    segments.next().filter(|s| !s.is_empty())?;
    if segments.next()? != "comments" {
        return None;
    }
    segments
        .next()
        .filter(|s| !s.is_empty())
        .map(ThreadId::new)
}

/// `true` on a single discussion, `false` on listings and everything else.
pub fn is_single_thread_view(url: &Url) -> bool {
    thread_id(url).is_some()
}

pub fn is_mobile_site(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host.starts_with("m.") || host.starts_with("i."))
}

pub fn is_alternate_layout(doc: &Document) -> bool {
    doc.get_element_by_id(ALTERNATE_ROOT_ID).is_some()
}

pub fn detect_variant(window: &Window) -> PageVariant {
    if is_mobile_site(window.location()) {
        PageVariant::Mobile
    } else if is_alternate_layout(&window.document()) {
        PageVariant::Redesign
    } else {
        PageVariant::Classic
    }
}
