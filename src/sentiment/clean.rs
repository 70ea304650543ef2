use crate::prelude::*;
use regex::Regex;
use unidecode::unidecode;

const ENTITIES: [(&str, &str); 9] = [
    ("&amp;", "&"),
    ("&hellip;", "..."),
    ("&nbsp;", " "),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#039;", "'"),
    ("&#8220;", "\""),
    ("&#8221;", "\""),
    ("&#8217;", "'"),
];

/// Normalises raw comment text before scoring: markup and links carry no
/// sentiment, and the lexicon is ASCII.
pub struct CommentCleaner {
    tag: Regex,
    url: Regex,
}

impl CommentCleaner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tag: Regex::new(r"<[^>]*>")?,
            url: Regex::new(r"(?i)\b(?:https?://|www\.)\S+")?,
        })
    }

    pub fn clean(&self, text: &str) -> String {
        let text = self.tag.replace_all(text, " ");
        let text = self.url.replace_all(&text, " ");
        let mut result = text.to_string();
        for (entity, replacement) in ENTITIES {
            result = result.replace(entity, replacement);
        }

        unidecode(&result)
    }
}
