use crate::options::HighlighterOptions;
use crate::stylesheet;
use bus::Subscribable;
use comments::page_mode;
use css::{StyleHandle, custom_property, inject_css, parse_color, parse_declarations, relative_luminance};
use dom::{DomPatchError, ObserveOptions};
use platform::{MutationBatch, MutationObserver, Window};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StyleError {
    #[error("failed to inject CSS: #{0} element not found")]
    MissingRoot(&'static str),
    #[error("failed to inject CSS: #{0} has no children")]
    RootWithoutChild(&'static str),
    #[error("failed to inject CSS: #{0} child has no style")]
    MissingStyleAttribute(&'static str),
    #[error("failed to inject CSS: failed to parse style attribute {0:?}")]
    UnparsableStyle(String),
    #[error("failed to inject CSS: background property missing from style attribute {0:?}")]
    MissingBackground(String),
    #[error("failed to inject CSS: background {0:?} is not a colour")]
    InvalidBackground(String),
    #[error(transparent)]
    Dom(#[from] DomPatchError),
}

impl StyleError {
    /// `true` for the errors raised while inferring light or dark mode.
    pub fn is_missing_style_context(&self) -> bool {
        !matches!(self, StyleError::Dom(_))
    }
}

/// Owns the highlight style sheet of one layout.
pub trait StyleInjector {
    /// Inject (or replace) the style sheet.
    fn inject(&self, window: &Window, options: &HighlighterOptions) -> Result<(), StyleError>;

    /// Remove the style sheet. Returns `false` if nothing was removed.
    fn remove(&self, window: &Window) -> bool;

    fn is_injected(&self) -> bool;
}

/// Injector matching the layout of the page in `window`.
pub fn injector_for(window: &Window) -> Box<dyn StyleInjector> {
    if page_mode::is_alternate_layout(&window.document()) {
        Box::new(AlternateStyles::new())
    } else {
        Box::new(ClassicStyles::new())
    }
}

fn release(window: &Window, handle: StyleHandle) -> bool {
    let removed = css::remove_css(&mut window.document_mut(), handle);
    if removed {
        log::info!("successfully removed CSS");
    } else {
        log::warn!("no CSS was removed");
    }
    removed
}

#[derive(Default)]
pub struct ClassicStyles {
    handle: RefCell<Option<StyleHandle>>,
}

impl ClassicStyles {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StyleInjector for ClassicStyles {
    fn inject(&self, window: &Window, options: &HighlighterOptions) -> Result<(), StyleError> {
        self.remove(window);
        log::info!("injecting CSS");
        let sheet = stylesheet::classic_css(options);
        let handle = inject_css(&mut window.document_mut(), &sheet)?;
        *self.handle.borrow_mut() = Some(handle);
        Ok(())
    }

    fn remove(&self, window: &Window) -> bool {
        let handle = self.handle.borrow_mut().take();
        match handle {
            Some(handle) => release(window, handle),
            None => {
                log::debug!("no CSS to remove");
                false
            }
        }
    }

    fn is_injected(&self) -> bool {
        self.handle.borrow().is_some()
    }
}

#[derive(Default)]
struct AlternateState {
    handle: RefCell<Option<StyleHandle>>,
    observer: RefCell<Option<MutationObserver>>,
    dark_mode: Cell<Option<bool>>,
}

/// Alternate layout styles.
///
/// Light or dark mode is read from the `--background` custom property on the
/// first child of the layout root. A change to that element's `style`
/// attribute re-injects the sheet for the new mode.
#[derive(Default)]
pub struct AlternateStyles {
    state: Rc<AlternateState>,
}

impl AlternateStyles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode detected by the last successful injection.
    pub fn dark_mode(&self) -> Option<bool> {
        self.state.dark_mode.get()
    }
}

impl StyleInjector for AlternateStyles {
    fn inject(&self, window: &Window, options: &HighlighterOptions) -> Result<(), StyleError> {
        AlternateState::inject(&self.state, window, options)
    }

    fn remove(&self, window: &Window) -> bool {
        self.state.remove(window)
    }

    fn is_injected(&self) -> bool {
        self.state.handle.borrow().is_some()
    }
}

impl AlternateState {
    fn inject(
        this: &Rc<Self>,
        window: &Window,
        options: &HighlighterOptions,
    ) -> Result<(), StyleError> {
        if this.handle.borrow().is_some() {
            this.remove(window);
        }
        log::info!("injecting CSS");

        let (themed, dark_mode) = detect_mode(window)?;
        log::debug!("detected style, dark mode: {dark_mode}");
        let sheet = stylesheet::alternate_css(options, dark_mode);
        let handle = inject_css(&mut window.document_mut(), &sheet)?;
        *this.handle.borrow_mut() = Some(handle);
        this.dark_mode.set(Some(dark_mode));

        log::debug!("installing style observer");
        let observer = window.observe(themed, ObserveOptions::attributes_of(&["style"]));
        let weak: Weak<Self> = Rc::downgrade(this);
        let weak_window = window.downgrade();
        let options = options.clone();
        observer.subscribe(move |_: &MutationBatch| {
            let (Some(state), Some(window)) = (weak.upgrade(), weak_window.upgrade()) else {
                return;
            };
            log::warn!("style change detected");
            if let Err(err) = AlternateState::inject(&state, &window, &options) {
                log::error!("{err}");
            }
        });
        *this.observer.borrow_mut() = Some(observer);
        log::info!("successfully injected CSS");
        Ok(())
    }

    fn remove(&self, window: &Window) -> bool {
        let observer = self.observer.borrow_mut().take();
        if let Some(observer) = observer {
            log::debug!("uninstalling style observer");
            observer.disconnect();
        }
        let handle = self.handle.borrow_mut().take();
        match handle {
            Some(handle) => release(window, handle),
            None => {
                log::info!("no CSS to remove");
                false
            }
        }
    }
}

/// Element carrying the theme variables, and whether its background is dark.
fn detect_mode(window: &Window) -> Result<(dom::NodeKey, bool), StyleError> {
    let root_id = page_mode::ALTERNATE_ROOT_ID;
    let doc = window.document();
    let root = doc
        .get_element_by_id(root_id)
        .ok_or(StyleError::MissingRoot(root_id))?;
    let themed = doc
        .first_element_child(root)
        .ok_or(StyleError::RootWithoutChild(root_id))?;
    let style = doc
        .attribute(themed, "style")
        .filter(|s| !s.is_empty())
        .ok_or(StyleError::MissingStyleAttribute(root_id))?;

    let declarations = parse_declarations(style);
    if !declarations.iter().any(|d| d.name.starts_with("--")) {
        return Err(StyleError::UnparsableStyle(style.to_string()));
    }
    let background = custom_property(&declarations, "background")
        .ok_or_else(|| StyleError::MissingBackground(style.to_string()))?;
    let color = parse_color(background)
        .ok_or_else(|| StyleError::InvalidBackground(background.to_string()))?;
    Ok((themed, relative_luminance(color) < 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_fixtures::FixturePage;

    fn style_count(window: &Window) -> usize {
        let doc = window.document();
        doc.elements_by_tag(doc.root(), "style").len()
    }

    #[test]
    fn classic_inject_and_remove() {
        let page = FixturePage::thread(&[], None);
        let styles = ClassicStyles::new();
        styles.inject(&page.window, &HighlighterOptions::default()).unwrap();
        styles.inject(&page.window, &HighlighterOptions::default()).unwrap();
        assert_eq!(style_count(&page.window), 1);

        assert!(styles.remove(&page.window));
        assert!(!styles.remove(&page.window));
        assert_eq!(style_count(&page.window), 0);
    }

    #[test]
    fn detects_dark_and_light_backgrounds() {
        let page = FixturePage::thread(&[], None);
        page.add_alternate_container(Some("--background:#1A1A1B;--bodyText:#D7DADC"))
            .unwrap();
        let styles = AlternateStyles::new();
        styles.inject(&page.window, &HighlighterOptions::default()).unwrap();
        assert_eq!(styles.dark_mode(), Some(true));

        let page = FixturePage::thread(&[], None);
        page.add_alternate_container(Some("--background:#FFFFFF")).unwrap();
        let styles = AlternateStyles::new();
        styles.inject(&page.window, &HighlighterOptions::default()).unwrap();
        assert_eq!(styles.dark_mode(), Some(false));
    }

    #[test]
    fn missing_style_context_is_reported() {
        let options = HighlighterOptions::default();

        let page = FixturePage::thread(&[], None);
        assert_eq!(
            AlternateStyles::new().inject(&page.window, &options),
            Err(StyleError::MissingRoot("2x-container"))
        );

        page.add_alternate_container(None).unwrap();
        assert_eq!(
            AlternateStyles::new().inject(&page.window, &options),
            Err(StyleError::MissingStyleAttribute("2x-container"))
        );

        let page = FixturePage::thread(&[], None);
        page.add_alternate_container(Some("color: red")).unwrap();
        let err = AlternateStyles::new().inject(&page.window, &options).unwrap_err();
        assert!(matches!(err, StyleError::UnparsableStyle(_)));
        assert!(err.is_missing_style_context());

        let page = FixturePage::thread(&[], None);
        page.add_alternate_container(Some("--bodyText:#000000")).unwrap();
        let err = AlternateStyles::new().inject(&page.window, &options).unwrap_err();
        assert!(matches!(err, StyleError::MissingBackground(_)));
        assert_eq!(style_count(&page.window), 0);
    }

    #[test]
    fn style_change_reinjects_for_new_mode() {
        let page = FixturePage::thread(&[], None);
        let themed = page.add_alternate_container(Some("--background:#FFFFFF")).unwrap();
        let styles = AlternateStyles::new();
        styles.inject(&page.window, &HighlighterOptions::default()).unwrap();
        assert_eq!(styles.dark_mode(), Some(false));

        page.window
            .document_mut()
            .set_attribute(themed, "style", "--background:#1A1A1B")
            .unwrap();
        page.window.deliver_mutations();

        assert_eq!(styles.dark_mode(), Some(true));
        assert_eq!(style_count(&page.window), 1);

        assert!(styles.remove(&page.window));
        page.window
            .document_mut()
            .set_attribute(themed, "style", "--background:#FFFFFF")
            .unwrap();
        page.window.deliver_mutations();
        assert_eq!(style_count(&page.window), 0);
        assert!(!styles.is_injected());
    }
}
