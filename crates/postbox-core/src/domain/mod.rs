//! Domain entities - the core business objects.

mod archive;
mod post;

pub use archive::ArchivedPost;
pub use post::{NewPost, Post, fields};
