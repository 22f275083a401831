//! Site-wide metadata and the `<head>` tags derived from it.

use crate::htmlrenderer::escaped;
use gtmpl::Value;
use serde::Deserialize;
use std::collections::HashMap;

/// The `og:type` of the index page.
pub const OG_TYPE: &str = "website";

/// Describes the site as a whole. Every field is optional and is passed
/// through to the page verbatim.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SiteMetadata {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// The canonical URL of the site.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    /// The AdSense publisher ID, if the theme shows ads.
    #[serde(default)]
    pub adsense: Option<String>,
}

/// A `<meta property="..." content="...">` tag.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaTag {
    pub property: &'static str,
    pub content: String,
}

impl SiteMetadata {
    /// Returns the Open Graph tags for the index page, in the order they're
    /// emitted. Missing values become empty content.
    pub fn meta_tags(&self) -> Vec<MetaTag> {
        let content = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            MetaTag {
                property: "og:title",
                content: content(&self.title),
            },
            MetaTag {
                property: "og:type",
                content: OG_TYPE.to_owned(),
            },
            MetaTag {
                property: "og:description",
                content: content(&self.description),
            },
            MetaTag {
                property: "og:url",
                content: content(&self.url),
            },
        ]
    }

    /// Converts the metadata into a template [`Value`]. Text is HTML-escaped;
    /// missing fields are `nil` so templates can test for them with `if`.
    pub fn to_value(&self) -> Value {
        let text = |v: &Option<String>| match v {
            Some(s) => Value::String(escaped(s)),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), text(&self.title));
        m.insert("description".to_owned(), text(&self.description));
        m.insert("url".to_owned(), text(&self.url));
        m.insert("author".to_owned(), text(&self.author));
        m.insert("adsense".to_owned(), text(&self.adsense));
        m.insert(
            "meta".to_owned(),
            Value::Array(self.meta_tags().iter().map(MetaTag::to_value).collect()),
        );
        Value::Object(m)
    }
}

impl MetaTag {
    fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("property".to_owned(), Value::String(self.property.to_owned()));
        m.insert("content".to_owned(), Value::String(escaped(&self.content)));
        Value::Object(m)
    }
}
