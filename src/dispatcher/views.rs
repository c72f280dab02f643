//! User-visible reply texts.

/// Label of the follow-up control
pub const MORE_LABEL: &str = "More";
/// Action identifier carried by the follow-up control
pub const MORE_ACTION: &str = "more";
/// Prefix of links to a subreddit's page
pub const SUBREDDIT_LINK_BASE: &str = "https://www.reddit.com/r/";

/// Reply texts, parameterised by the configured command prefix
#[derive(Debug, Clone)]
pub struct ReplyText {
    prefix: String,
}

impl ReplyText {
    /// Texts for commands written as `<prefix>show`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Malformed `show`
    #[must_use]
    pub fn usage(&self) -> String {
        "Please provide the command and subreddit name.".to_string()
    }

    /// Acknowledgement sent before the listing request
    #[must_use]
    pub fn please_wait(&self) -> String {
        "Please wait while I fetch the data for you.".to_string()
    }

    /// Listing yielded no accepted images
    #[must_use]
    pub fn no_data(&self) -> String {
        format!(
            "No images found. Please run the `{}show` command again to get new data.",
            self.prefix
        )
    }

    /// Static help
    #[must_use]
    pub fn help(&self) -> String {
        format!(
            "Please provide the command and subreddit name to start like `{}show aww`",
            self.prefix
        )
    }

    /// Follow-up before any successful `show`
    #[must_use]
    pub fn choose_subreddit(&self) -> String {
        format!(
            "Please choose a subreddit with the `{}show` command.",
            self.prefix
        )
    }

    /// Queue drained
    #[must_use]
    pub fn queue_empty(&self) -> String {
        "Empty list. Please choose a new subreddit.".to_string()
    }
}

impl Default for ReplyText {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COMMAND_PREFIX)
    }
}

/// Title of a rendered post
#[must_use]
pub fn post_title(subreddit: &str) -> String {
    format!("r/{subreddit}")
}

/// Link to the subreddit's page
#[must_use]
pub fn subreddit_link(subreddit: &str) -> String {
    format!("{SUBREDDIT_LINK_BASE}{subreddit}")
}
