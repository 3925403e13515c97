use bus::Subscribable;
use comments::{CommentNode, CommentThread, Page, detect_page};
use env_logger::Env;
use highlight::{CommentHighlighter, HighlighterOptions};
use page_fixtures::{CommentFixture, FixturePage};
use platform::Window;
use std::error::Error;
use std::rc::Rc;
use std::time::Duration;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let options = match std::env::args_os().nth(1) {
        Some(path) => HighlighterOptions::load(path)?,
        None => HighlighterOptions::default(),
    };

    let fixture = FixturePage::thread(
        &[
            CommentFixture::new("t1_first")
                .author("alice")
                .reply(CommentFixture::new("t1_reply").author("bob")),
            CommentFixture::deleted("t1_gone"),
        ],
        Some("demo_user"),
    );
    let window = fixture.window.clone();

    let Some(page) = detect_page(&window) else {
        return Err("page layout not supported".into());
    };
    log::info!("logged in as {:?}", page.logged_in_user());

    let highlighter = match CommentHighlighter::for_page(&window, options) {
        Ok(highlighter) => Some(Rc::new(highlighter)),
        Err(err) => {
            log::error!("continuing without highlighting: {err}");
            None
        }
    };

    if let Some(highlighter) = &highlighter {
        let highlighter = Rc::clone(highlighter);
        page.on_thread_opened().subscribe(move |thread: &Rc<CommentThread>| {
            let highlighter = Rc::clone(&highlighter);
            thread
                .on_comment_added()
                .subscribe(move |comment: &Rc<CommentNode>| highlighter.highlight(comment));
        });
    }

    fixture.insert_reply("t1_first", &CommentFixture::new("t1_new").author("carol"))?;
    window.deliver_mutations();
    print_state("after new reply", &window, page.as_ref());

    if let Some(target) = fixture.body_of("t1_new") {
        window.click(target);
        print_state("after click", &window, page.as_ref());
    }

    window.run(Duration::from_millis(16));
    print_state("after transition", &window, page.as_ref());

    if let Some(highlighter) = &highlighter {
        highlighter.dispose();
    }
    page.dispose();
    Ok(())
}

fn print_state(label: &str, window: &Window, page: &dyn Page) {
    println!("== {label}");
    let Some(thread) = page.on_thread_opened().current() else {
        println!("   (no thread)");
        return;
    };
    let doc = window.document();
    for comment in thread.all_comments() {
        let classes: Vec<_> = doc.class_list(comment.element()).collect();
        println!(
            "   {:<10} author={:<8} classes=[{}]",
            comment.id().as_str(),
            comment.author().unwrap_or_else(|| "-".into()),
            classes.join(" ")
        );
    }
}
