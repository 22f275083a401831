//! Post-render hooks. A [`HookChain`] runs over every rendered document before
//! it's written to disk, so corrections that depend on the final markup (as
//! opposed to any one post's markdown) live here.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Something that runs after a document has been rendered and may rewrite it.
pub trait PostRender {
    /// A short name for log messages.
    fn name(&self) -> &str;

    /// Returns the rewritten document, or `Cow::Borrowed(html)` when nothing
    /// needed to change.
    fn apply<'a>(&self, html: &'a str) -> Cow<'a, str>;
}

/// An ordered list of [`PostRender`] hooks.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn PostRender>>,
}

impl HookChain {
    pub fn new() -> Self {
        HookChain::default()
    }

    /// Registers `hook` to run after every hook registered before it.
    pub fn register<H: PostRender + 'static>(&mut self, hook: H) -> &mut Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// The chain every index page goes through.
    pub fn standard() -> Self {
        let mut chain = HookChain::new();
        chain.register(TableClassPatch::default());
        chain
    }

    /// Runs every hook in registration order.
    pub fn run(&self, html: String) -> String {
        self.hooks.iter().fold(html, |html, hook| {
            let patched = match hook.apply(&html) {
                Cow::Borrowed(_) => None,
                Cow::Owned(patched) => Some(patched),
            };
            match patched {
                Some(patched) => {
                    log::debug!("post-render hook `{}` rewrote the document", hook.name());
                    patched
                }
                None => html,
            }
        })
    }
}

static TABLE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<table(\s[^>]*)?>").unwrap());

static CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\sclass\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#).unwrap()
});

/// Makes sure every `<table>` carries a CSS class (by default `table`, which
/// is what Bootstrap-style themes key their table styling on). Tables that
/// already have the class are left alone; tables with other classes get it
/// appended.
pub struct TableClassPatch {
    class: String,
}

impl Default for TableClassPatch {
    fn default() -> Self {
        TableClassPatch::new("table")
    }
}

impl TableClassPatch {
    pub fn new(class: &str) -> Self {
        TableClassPatch {
            class: class.to_owned(),
        }
    }

    fn patch_tag(&self, attrs: &str) -> Option<String> {
        match CLASS_ATTR.captures(attrs) {
            None => Some(format!(r#"<table class="{}"{}>"#, self.class, attrs)),
            Some(caps) => {
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map_or("", |m| m.as_str());
                if value.split_whitespace().any(|c| c == self.class) {
                    return None;
                }

                let whole = caps.get(0)?;
                let classes = match value.trim() {
                    "" => self.class.clone(),
                    existing => format!("{} {}", existing, self.class),
                };
                Some(format!(
                    r#"<table{}{}"{}"{}>"#,
                    &attrs[..whole.start()],
                    &caps[1],
                    classes,
                    &attrs[whole.end()..],
                ))
            }
        }
    }
}

impl PostRender for TableClassPatch {
    fn name(&self) -> &str {
        "table-class"
    }

    fn apply<'a>(&self, html: &'a str) -> Cow<'a, str> {
        let mut changed = false;
        let patched = TABLE_START.replace_all(html, |caps: &Captures| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            match self.patch_tag(attrs) {
                Some(tag) => {
                    changed = true;
                    tag
                }
                None => caps[0].to_owned(),
            }
        });
        if changed {
            Cow::Owned(patched.into_owned())
        } else {
            Cow::Borrowed(html)
        }
    }
}
