use crate::content::Post;

/// Returns up to `max_count` posts that share at least one label with
/// `target`.
///
/// Candidates are taken in their order in `all_posts`, first match wins; they
/// are not ranked by how many labels they share. `target` itself (matched by
/// ID) is never included. Labels are compared by slug.
pub fn related_posts<'a>(target: &Post, all_posts: &'a [Post], max_count: usize) -> Vec<&'a Post> {
    if target.label_slugs.is_empty() {
        return Vec::new();
    }

    all_posts
        .iter()
        .filter(|post| post.id() != target.id())
        .filter(|post| {
            post.label_slugs
                .iter()
                .any(|label_slug| target.has_label(label_slug))
        })
        .take(max_count)
        .collect()
}
