//! Scoped style-sheet injection into the document head.

use dom::{Document, DomPatchError, ElementSpec, NodeKey};

/// Handle to an injected `<style>` element. Releasing it through
/// [`remove_css`] removes the element.
#[derive(Debug, PartialEq, Eq)]
pub struct StyleHandle(NodeKey);

impl StyleHandle {
    pub fn key(&self) -> NodeKey {
        self.0
    }
}

/// Append a `<style>` element holding `css` to the document head.
pub fn inject_css(doc: &mut Document, css: &str) -> Result<StyleHandle, DomPatchError> {
    let head = doc.head().ok_or(DomPatchError::MissingHead)?;
    let (key, patches) = doc.patches_for(head, &ElementSpec::new("style").text(css));
    doc.apply(&patches)?;
    log::debug!("injected style sheet {key:?} ({} bytes)", css.len());
    Ok(StyleHandle(key))
}

/// Remove a previously injected sheet. Returns `false` if it was already gone.
pub fn remove_css(doc: &mut Document, handle: StyleHandle) -> bool {
    match doc.remove_node(handle.0) {
        Ok(()) => true,
        Err(err) => {
            log::debug!("style sheet {:?} already removed: {err}", handle.0);
            false
        }
    }
}
