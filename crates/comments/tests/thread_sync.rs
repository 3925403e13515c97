use bus::Subscribable;
use comments::{ClassicPage, CommentNode, CommentThread, Page, ThreadLayout};
use core_types::ThreadId;
use dom::ElementSpec;
use page_fixtures::{CommentFixture, FixturePage};
use std::cell::RefCell;
use std::rc::Rc;

fn open(page: &FixturePage) -> Rc<CommentThread> {
    CommentThread::open(&page.window, ThreadId::new("abc123"), ThreadLayout::default())
}

fn record_added(thread: &CommentThread) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    thread
        .on_comment_added()
        .subscribe(move |c: &Rc<CommentNode>| sink.borrow_mut().push(c.id().to_string()));
    seen
}

#[test]
fn inserted_reply_is_announced_once() {
    let page = FixturePage::thread(&[CommentFixture::new("a")], None);
    let thread = open(&page);
    let seen = record_added(&thread);

    page.insert_reply("a", &CommentFixture::new("b")).unwrap();
    assert!(seen.borrow().is_empty(), "records are delivered at checkpoints");
    page.window.deliver_mutations();

    assert_eq!(*seen.borrow(), vec!["b"]);
    let parent = thread.comment_by_id("a").unwrap();
    let replies: Vec<_> = parent.child_comments().iter().map(|c| c.id().to_string()).collect();
    assert_eq!(replies, vec!["b"]);
}

#[test]
fn reinserting_a_known_identity_is_ignored() {
    let page = FixturePage::thread(&[CommentFixture::new("a")], None);
    let thread = open(&page);
    let seen = record_added(&thread);
    let original = thread.comment_by_id("a").unwrap();

    page.insert_top_level(&CommentFixture::new("a").body("duplicate")).unwrap();
    page.window.deliver_mutations();

    assert!(seen.borrow().is_empty());
    assert_eq!(thread.len(), 1);
    assert!(Rc::ptr_eq(&original, &thread.comment_by_id("a").unwrap()));
}

#[test]
fn inserted_subtree_announces_replies_first() {
    let page = FixturePage::thread(&[CommentFixture::new("a")], None);
    let thread = open(&page);
    let seen = record_added(&thread);

    let subtree = CommentFixture::new("b")
        .reply(CommentFixture::new("c").reply(CommentFixture::new("d")))
        .reply(CommentFixture::new("e"));
    page.insert_reply("a", &subtree).unwrap();
    page.window.deliver_mutations();

    assert_eq!(*seen.borrow(), vec!["d", "c", "e", "b"]);
    assert_eq!(thread.len(), 5);
}

#[test]
fn inserted_comment_without_identity_is_skipped() {
    let page = FixturePage::thread(&[CommentFixture::new("a")], None);
    let thread = open(&page);
    let seen = record_added(&thread);

    page.insert_reply("a", &CommentFixture::without_id()).unwrap();
    page.insert_reply("a", &CommentFixture::new("b")).unwrap();
    page.window.deliver_mutations();

    assert_eq!(*seen.borrow(), vec!["b"]);
    let replies = thread.comment_by_id("a").unwrap().child_comments();
    assert_eq!(replies.len(), 1);
}

#[test]
fn insertions_outside_containers_are_ignored() {
    let page = FixturePage::thread(&[CommentFixture::new("a")], None);
    let thread = open(&page);
    let seen = record_added(&thread);

    // A comment-classed element inside the comment's entry, not under a listing.
    let entry = {
        let doc = page.window.document();
        doc.child_chain(page.comment("a").unwrap(), &["entry"])[0]
    };
    page.insert_element(
        entry,
        &ElementSpec::new("div").class("comment").attr("data-fullname", "stray"),
    )
    .unwrap();
    page.window.deliver_mutations();

    assert!(seen.borrow().is_empty());
    assert!(thread.comment_by_id("stray").is_none());
}

#[test]
fn every_child_comment_is_indexed() {
    let page = FixturePage::thread(
        &[CommentFixture::new("a").reply(CommentFixture::new("b").reply(CommentFixture::new("c")))],
        None,
    );
    let thread = open(&page);
    page.insert_reply("b", &CommentFixture::new("d")).unwrap();
    page.insert_reply("d", &CommentFixture::new("e")).unwrap();
    page.window.deliver_mutations();

    for comment in thread.all_comments() {
        for child in comment.child_comments() {
            let indexed = thread.comment_by_id(child.id().as_str()).unwrap();
            assert!(Rc::ptr_eq(&indexed, &child));
        }
    }
    assert_eq!(thread.len(), 5);
}

#[test]
fn node_metadata() {
    let page = FixturePage::thread(
        &[
            CommentFixture::new("a").author("alice").posted_at("2014-02-20T00:41:27+00:00"),
            CommentFixture::deleted("b"),
            CommentFixture::new("c").posted_at("yesterday"),
        ],
        None,
    );
    let thread = open(&page);

    let a = thread.comment_by_id("a").unwrap();
    assert_eq!(a.author().as_deref(), Some("alice"));
    assert_eq!(a.posted_at().unwrap().to_rfc3339(), "2014-02-20T00:41:27+00:00");
    assert_eq!(Some(a.element()), page.comment("a"));

    let b = thread.comment_by_id("b").unwrap();
    assert_eq!(b.author(), None);
    assert_eq!(b.posted_at(), None);

    assert_eq!(thread.comment_by_id("c").unwrap().posted_at(), None);
}

#[test]
fn clicks_reach_only_the_nearest_comment() {
    let page = FixturePage::thread(&[CommentFixture::new("a").reply(CommentFixture::new("b"))], None);
    let thread = open(&page);
    let clicks = Rc::new(RefCell::new(Vec::new()));
    for id in ["a", "b"] {
        let sink = Rc::clone(&clicks);
        thread
            .comment_by_id(id)
            .unwrap()
            .on_click()
            .subscribe(move |_: &()| sink.borrow_mut().push(id));
    }

    page.window.click(page.body_of("b").unwrap());
    page.window.click(page.body_of("a").unwrap());

    assert_eq!(*clicks.borrow(), vec!["b", "a"]);
}

#[test]
fn page_dispose_detaches_everything() {
    let page = FixturePage::thread(&[CommentFixture::new("a")], Some("me"));
    let adapter = ClassicPage::new(&page.window);
    let thread = adapter.thread().unwrap();
    let seen = record_added(&thread);
    assert!(!page.window.clicks().is_empty());

    adapter.dispose();
    page.insert_top_level(&CommentFixture::new("late")).unwrap();
    page.window.deliver_mutations();

    assert!(seen.borrow().is_empty());
    assert!(page.window.clicks().is_empty());
    assert!(adapter.on_thread_opened().current().is_none());
}
