mod collections;
mod labels;
mod post;
mod related;

pub use collections::*;
pub use labels::*;
pub use post::*;
pub use related::*;
