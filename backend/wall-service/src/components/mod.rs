/// Stateful view components
///
/// - `composer`: draft, attachment and validation state for a new post
/// - `feed`: the ordered post list plus the live subscription feeding it
/// - `preview`: scoped preview references for selected attachments
/// - `profile`: the static profile sidebar
pub mod composer;
pub mod feed;
pub mod preview;
pub mod profile;

pub use composer::{Composer, ComposerError, ComposerPhase, KeyPress};
pub use feed::{Feed, FeedView};
pub use preview::{PreviewHandle, PreviewRegistry, PreviewStore};
pub use profile::Profile;
