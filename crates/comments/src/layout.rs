/// Markup vocabulary of a discussion page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadLayout {
    /// Classes that together mark the thread's root listing.
    pub root_classes: Vec<String>,
    /// Class of every listing that directly holds comments.
    pub container_class: String,
    pub comment_class: String,
    pub identity_attribute: String,
    pub author_attribute: String,
    /// Direct-child class chain from a comment to its replies.
    pub child_chain: Vec<String>,
    pub time_tag: String,
    pub time_attribute: String,
}

impl ThreadLayout {
    pub(crate) fn root_classes(&self) -> Vec<&str> {
        self.root_classes.iter().map(String::as_str).collect()
    }

    pub(crate) fn child_chain(&self) -> Vec<&str> {
        self.child_chain.iter().map(String::as_str).collect()
    }
}

impl Default for ThreadLayout {
    fn default() -> Self {
        Self {
            root_classes: vec!["sitetable".into(), "nestedlisting".into()],
            container_class: "sitetable".into(),
            comment_class: "comment".into(),
            identity_attribute: "data-fullname".into(),
            author_attribute: "data-author".into(),
            child_chain: vec!["child".into(), "listing".into(), "comment".into()],
            time_tag: "time".into(),
            time_attribute: "datetime".into(),
        }
    }
}
