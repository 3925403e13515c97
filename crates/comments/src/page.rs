use crate::layout::ThreadLayout;
use crate::notifier::ThreadOpenNotifier;
use crate::page_mode;
use crate::thread::CommentThread;
use core_types::PageVariant;
use platform::Window;
use std::cell::RefCell;
use std::rc::Rc;

/// One loaded page as seen by the highlighter.
pub trait Page {
    fn variant(&self) -> PageVariant;

    /// Replays the open thread to late subscribers.
    fn on_thread_opened(&self) -> &ThreadOpenNotifier;

    /// Name of the logged-in user, `None` when logged out.
    fn logged_in_user(&self) -> Option<String>;

    fn dispose(&self);
}

/// Adapter for the classic server-rendered layout.
pub struct ClassicPage {
    window: Window,
    notifier: ThreadOpenNotifier,
    thread: RefCell<Option<Rc<CommentThread>>>,
}

impl ClassicPage {
    pub fn new(window: &Window) -> Self {
        Self::with_layout(window, ThreadLayout::default())
    }

    pub fn with_layout(window: &Window, layout: ThreadLayout) -> Self {
        let notifier = ThreadOpenNotifier::for_window(window);
        let thread = page_mode::thread_id(window.location())
            .map(|id| CommentThread::open(window, id, layout));
        if let Some(thread) = &thread {
            notifier.open(Rc::clone(thread));
        }
        Self {
            window: window.clone(),
            notifier,
            thread: RefCell::new(thread),
        }
    }

    pub fn is_supported(window: &Window) -> bool {
        page_mode::detect_variant(window) == PageVariant::Classic
    }

    pub fn thread(&self) -> Option<Rc<CommentThread>> {
        self.thread.borrow().clone()
    }
}

impl Page for ClassicPage {
    fn variant(&self) -> PageVariant {
        PageVariant::Classic
    }

    fn on_thread_opened(&self) -> &ThreadOpenNotifier {
        &self.notifier
    }

    fn logged_in_user(&self) -> Option<String> {
        let doc = self.window.document();
        let user = *doc.elements_by_class(doc.root(), "user").first()?;
        let link = *doc.elements_by_tag(user, "a").first()?;
        if doc.has_class(link, "login-required") {
            return None;
        }
        let name = doc.text_content(link);
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    fn dispose(&self) {
        self.notifier.dispose();
        let thread = self.thread.borrow_mut().take();
        if let Some(thread) = thread {
            thread.dispose();
        }
    }
}

/// Adapter for the page in `window`, if its layout is supported.
pub fn detect_page(window: &Window) -> Option<Box<dyn Page>> {
    match page_mode::detect_variant(window) {
        PageVariant::Classic => Some(Box::new(ClassicPage::new(window))),
        variant => {
            log::info!("no page adapter for {variant:?} layout");
            None
        }
    }
}
