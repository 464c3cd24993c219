use derive_more::Deref;
use indexmap::IndexMap;

use crate::content::{label_slug, Post};

/// The posts filed under a single label.
#[derive(Debug, PartialEq)]
pub struct LabelGroup<'a> {
    /// The label as it was first spelled in the source posts.
    pub display_name: &'a str,

    /// The posts carrying the label, in source order.
    pub posts: Vec<&'a Post>,
}

/// Posts grouped by label slug, in the order each label was first seen.
#[derive(Debug, Default, Deref)]
pub struct LabelIndex<'a>(IndexMap<String, LabelGroup<'a>>);

impl<'a> LabelIndex<'a> {
    /// Returns the display name for the label with the given slug.
    pub fn display_name(&self, label_slug: &str) -> Option<&'a str> {
        self.0.get(label_slug).map(|group| group.display_name)
    }
}

/// Groups the given posts by label.
///
/// Labels whose slugs collide (e.g., `Tech` and `tech `) are merged into one
/// group, named after whichever spelling appears first. A post that carries
/// two colliding spellings is only listed once in the group.
pub fn build_label_index(posts: &[Post]) -> LabelIndex<'_> {
    let mut groups: IndexMap<String, LabelGroup> = IndexMap::new();

    for post in posts {
        for label in &post.meta.labels {
            let group = groups
                .entry(label_slug(label))
                .or_insert_with(|| LabelGroup {
                    display_name: label,
                    posts: Vec::new(),
                });

            let already_listed = group
                .posts
                .last()
                .is_some_and(|last| std::ptr::eq(*last, post));
            if !already_listed {
                group.posts.push(post);
            }
        }
    }

    LabelIndex(groups)
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    use crate::content::{AnnotateOptions, PostMeta};

    use super::*;

    fn make_post(id: &str, labels: &[&str]) -> Post {
        Post::from_meta(
            PostMeta {
                id: id.to_string(),
                title: format!("Post {id}"),
                content: String::new(),
                labels: labels.iter().map(|label| label.to_string()).collect(),
                published: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
                updated: None,
                url: None,
                author: None,
                extra: Default::default(),
            },
            &AnnotateOptions { preview_words: 10 },
        )
    }

    fn ids(group: &LabelGroup) -> Vec<String> {
        group.posts.iter().map(|post| post.id().to_string()).collect()
    }

    #[test]
    fn test_build_label_index() {
        let posts = vec![
            make_post("1", &["Rust", "Web"]),
            make_post("2", &["Web"]),
            make_post("3", &[]),
            make_post("4", &["Rust"]),
        ];

        let index = build_label_index(&posts);

        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["rust", "web"]);
        assert_eq!(ids(&index["rust"]), vec!["1", "4"]);
        assert_eq!(ids(&index["web"]), vec!["1", "2"]);
    }

    #[test]
    fn test_colliding_labels_are_merged_under_first_spelling() {
        let posts = vec![make_post("1", &["Tech"]), make_post("2", &["tech "])];

        let index = build_label_index(&posts);

        assert_eq!(index.len(), 1);
        assert_eq!(index.display_name("tech"), Some("Tech"));
        assert_eq!(ids(&index["tech"]), vec!["1", "2"]);
    }

    #[test]
    fn test_post_with_colliding_labels_is_listed_once() {
        let posts = vec![make_post("1", &["Tech", "TECH"])];

        let index = build_label_index(&posts);

        assert_eq!(ids(&index["tech"]), vec!["1"]);
    }

    #[test]
    fn test_groups_reference_the_source_posts() {
        let posts = vec![make_post("1", &["A"])];

        let index = build_label_index(&posts);

        assert!(std::ptr::eq(index["a"].posts[0], &posts[0]));
    }

    #[test]
    fn test_empty_input() {
        let posts: Vec<Post> = Vec::new();

        let index = build_label_index(&posts);

        assert!(index.is_empty());
        assert_eq!(index.display_name("anything"), None);
    }
}
