use derive_more::{Deref, DerefMut};

use crate::content::{AnnotateOptions, Post, PostMeta};

/// The posts of a single run, in source order.
#[derive(Debug, Default, Deref, DerefMut)]
pub struct Posts(Vec<Post>);

impl Posts {
    /// Annotates each of the given posts, keeping their order.
    pub fn from_metas(metas: Vec<PostMeta>, options: &AnnotateOptions) -> Self {
        Self(
            metas
                .into_iter()
                .map(|meta| Post::from_meta(meta, options))
                .collect(),
        )
    }

    /// Returns the raw posts, for writing them back out as JSON.
    pub fn metas(&self) -> Vec<&PostMeta> {
        self.0.iter().map(|post| &post.meta).collect()
    }
}
