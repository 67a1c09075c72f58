//! Chat line parsing.
//!
//! The chat window names each line "From <sender>, <body>, sent on <time>".
//! Links are shortened to their host before the sender and body are pulled
//! out, so the speech engine doesn't spell out whole URLs.

use std::sync::LazyLock;

use regex::Regex;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://([\w.]*/?).*?([\s,])").expect("valid link pattern"));

static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)From (?P<from>.*?), (?P<body>.*?), sent on").expect("valid line pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub from: String,
    pub body: String,
}

/// A line that doesn't follow the message template (join notices, date
/// separators...). Carries the link-stripped text for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unparsed(pub String);

/// Replace each link with its host and the delimiter that ended it.
pub fn strip_links(text: &str) -> String {
    LINK.replace_all(text, "${1}${2}").into_owned()
}

pub fn parse(raw: &str) -> Result<ParsedMessage, Unparsed> {
    let text = strip_links(raw);
    match LINE.captures(&text) {
        Some(caps) => Ok(ParsedMessage {
            from: caps["from"].to_string(),
            body: caps["body"].to_string(),
        }),
        None => Err(Unparsed(text)),
    }
}
