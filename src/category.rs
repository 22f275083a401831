//! Defines the [`Category`] type, which represents a [`crate::post::PostRecord`]
//! category as shown under its preview.

/// A post category. Categories are compared by slug so e.g., `DevOps` and
/// `devops` resolve to the same category.
#[derive(Clone, Debug)]
pub struct Category {
    /// The category as written in the frontmatter.
    pub name: String,

    /// The slugified name, safe to drop into a URL.
    pub slug: String,

    /// The category's page, `{path_prefix}/categories/{slug}/`.
    pub url: String,
}

impl Category {
    pub fn new(name: &str, path_prefix: &str) -> Category {
        let slug = slug::slugify(name);
        Category {
            name: name.to_owned(),
            url: format!("{}/categories/{}/", path_prefix, slug),
            slug,
        }
    }

    /// Builds the categories for a post, dropping duplicates (by slug) and
    /// names that slugify to nothing. First occurrence wins.
    pub fn from_names<S: AsRef<str>>(names: &[S], path_prefix: &str) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::with_capacity(names.len());
        for name in names {
            let category = Category::new(name.as_ref(), path_prefix);
            if !category.slug.is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }
}

impl PartialEq for Category {
    /// Delegates directly to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Category {}
