/// Business logic layer
///
/// - `posts`: the post repository (list, create, delete, subscribe)
/// - `media`: attachment rules and storage naming
pub mod media;
pub mod posts;

pub use posts::{PostCallback, PostDraft, PostRepository, PostService, Subscription};
