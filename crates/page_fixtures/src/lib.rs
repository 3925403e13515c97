//! Builders for classic-layout discussion pages.
//!
//! A comment renders as
//!
//! ```text
//! div.thing.comment#thing_<id>[data-fullname][data-author]
//!   div.entry
//!     p.tagline > time[datetime]
//!     div.usertext-body > div.md > "<body>"
//!   div.child
//!     div.sitetable.listing > <replies>
//! ```
//!
//! and the thread page wraps top-level comments in `div.sitetable.nestedlisting`.

use dom::{Document, DomPatchError, ElementSpec, NodeKey};
use platform::Window;
use url::Url;

pub const THREAD_URL: &str = "https://old.reddit.com/r/rust/comments/abc123/some_title/";
pub const LISTING_URL: &str = "https://old.reddit.com/r/rust/";

#[derive(Clone, Debug)]
pub struct CommentFixture {
    id: Option<String>,
    author: Option<String>,
    posted_at: Option<String>,
    body: String,
    replies: Vec<CommentFixture>,
}

impl CommentFixture {
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            author: Some("someone".to_string()),
            posted_at: Some("2014-02-20T00:41:27+00:00".to_string()),
            body: format!("body of {id}"),
            replies: Vec::new(),
        }
    }

    /// A comment element lacking its identity attribute.
    pub fn without_id() -> Self {
        Self {
            id: None,
            ..Self::new("anonymous")
        }
    }

    /// A deleted comment: no author, no timestamp.
    pub fn deleted(id: &str) -> Self {
        Self {
            author: None,
            posted_at: None,
            body: "[deleted]".to_string(),
            ..Self::new(id)
        }
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn posted_at(mut self, datetime: &str) -> Self {
        self.posted_at = Some(datetime.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn reply(mut self, reply: CommentFixture) -> Self {
        self.replies.push(reply);
        self
    }

    pub fn to_element(&self) -> ElementSpec {
        let mut element = ElementSpec::new("div").class("thing").class("comment");
        if let Some(id) = &self.id {
            element = element
                .id(&format!("thing_{id}"))
                .attr("data-fullname", id);
        }
        if let Some(author) = &self.author {
            element = element.attr("data-author", author);
        }

        let mut tagline = ElementSpec::new("p").class("tagline");
        if let Some(author) = &self.author {
            tagline = tagline.child(ElementSpec::new("a").class("author").text(author));
        }
        if let Some(datetime) = &self.posted_at {
            tagline = tagline.child(ElementSpec::new("time").attr("datetime", datetime).text("1 hour ago"));
        }
        let entry = ElementSpec::new("div")
            .class("entry")
            .child(tagline)
            .child(
                ElementSpec::new("div")
                    .class("usertext-body")
                    .child(ElementSpec::new("div").class("md").text(&self.body)),
            );
        let listing = ElementSpec::new("div")
            .class("sitetable")
            .class("listing")
            .children(self.replies.iter().map(CommentFixture::to_element));

        element
            .child(entry)
            .child(ElementSpec::new("div").class("child").child(listing))
    }
}

/// `span.user > a`; logged-out pages carry the `login-required` link.
pub fn user_bar(user: Option<&str>) -> ElementSpec {
    let link = match user {
        Some(name) => ElementSpec::new("a").attr("href", "/user/me").text(name),
        None => ElementSpec::new("a")
            .class("login-required")
            .text("login or register"),
    };
    ElementSpec::new("span").class("user").child(link)
}

pub fn nested_listing(comments: &[CommentFixture]) -> ElementSpec {
    ElementSpec::new("div")
        .class("sitetable")
        .class("nestedlisting")
        .children(comments.iter().map(CommentFixture::to_element))
}

/// Loaded thread page.
pub struct FixturePage {
    pub window: Window,
    /// The `.sitetable.nestedlisting` root, if the page has one.
    pub listing: Option<NodeKey>,
}

impl FixturePage {
    /// A single-thread page holding `comments`.
    pub fn thread(comments: &[CommentFixture], user: Option<&str>) -> Self {
        Self::build(THREAD_URL, Some(comments), user)
    }

    /// A single-thread URL whose markup has no comment listing.
    pub fn thread_without_listing() -> Self {
        Self::build(THREAD_URL, None, None)
    }

    /// A subreddit listing page (not a single thread).
    pub fn listing_page(comments: &[CommentFixture]) -> Self {
        Self::build(LISTING_URL, Some(comments), None)
    }

    pub fn at(url: &str, comments: &[CommentFixture]) -> Self {
        Self::build(url, Some(comments), None)
    }

    fn build(url: &str, comments: Option<&[CommentFixture]>, user: Option<&str>) -> Self {
        let mut doc = Document::new();
        let body = doc.body().unwrap_or(doc.root());
        let header = ElementSpec::new("div").id("header").child(user_bar(user));
        let mut content = ElementSpec::new("div").class("content");
        if let Some(comments) = comments {
            content = content.child(nested_listing(comments));
        }
        for spec in [header, content] {
            let (_, patches) = doc.patches_for(body, &spec);
            if let Err(err) = doc.apply(&patches) {
                panic!("fixture markup rejected: {err}");
            }
        }
        let listing = doc
            .elements_by_classes(doc.root(), &["sitetable", "nestedlisting"])
            .first()
            .copied();
        let url = Url::parse(url).unwrap_or_else(|err| panic!("bad fixture url {url}: {err}"));
        Self {
            window: Window::new(url, doc),
            listing,
        }
    }

    /// Element of the comment with identity `id`.
    pub fn comment(&self, id: &str) -> Option<NodeKey> {
        self.window
            .document()
            .get_element_by_id(&format!("thing_{id}"))
    }

    /// The `.md` body element of comment `id`, a typical click target.
    pub fn body_of(&self, id: &str) -> Option<NodeKey> {
        let comment = self.comment(id)?;
        let doc = self.window.document();
        doc.child_chain(comment, &["entry", "usertext-body", "md"])
            .first()
            .copied()
    }

    /// Insert `reply` under comment `parent_id`. Mutation records are queued
    /// but not delivered.
    pub fn insert_reply(&self, parent_id: &str, reply: &CommentFixture) -> Result<NodeKey, DomPatchError> {
        let parent = self
            .comment(parent_id)
            .ok_or(DomPatchError::MissingKey(NodeKey::INVALID))?;
        let listing = {
            let doc = self.window.document();
            doc.child_chain(parent, &["child", "listing"])
                .first()
                .copied()
                .ok_or(DomPatchError::InvalidParent(parent))?
        };
        self.insert_into(listing, reply)
    }

    /// Append `comment` to the top-level listing.
    pub fn insert_top_level(&self, comment: &CommentFixture) -> Result<NodeKey, DomPatchError> {
        let listing = self
            .listing
            .ok_or(DomPatchError::MissingKey(NodeKey::INVALID))?;
        self.insert_into(listing, comment)
    }

    /// Insert an arbitrary element somewhere; used to check filtering.
    pub fn insert_element(&self, parent: NodeKey, spec: &ElementSpec) -> Result<NodeKey, DomPatchError> {
        let (key, patches) = self.window.document_mut().patches_for(parent, spec);
        self.window.apply(&patches)?;
        Ok(key)
    }

    fn insert_into(&self, listing: NodeKey, comment: &CommentFixture) -> Result<NodeKey, DomPatchError> {
        self.insert_element(listing, &comment.to_element())
    }

    /// Add the alternate-layout theme container `#2x-container > div[style]`.
    pub fn add_alternate_container(&self, style: Option<&str>) -> Result<NodeKey, DomPatchError> {
        let mut themed = ElementSpec::new("div");
        if let Some(style) = style {
            themed = themed.attr("style", style);
        }
        let body = self
            .window
            .document()
            .body()
            .ok_or(DomPatchError::MissingKey(NodeKey::INVALID))?;
        let container = self.insert_element(body, &ElementSpec::new("div").id("2x-container").child(themed))?;
        let themed = self.window.document().first_element_child(container);
        themed.ok_or(DomPatchError::InvalidParent(container))
    }
}
