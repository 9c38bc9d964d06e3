/// Shared application state handed to every handler
use crate::components::{Composer, FeedView, PreviewRegistry, Profile};
use crate::services::PostRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PostRepository>,
    pub previews: Arc<PreviewRegistry>,
    pub profile: Profile,
}

impl AppState {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self {
            repo,
            previews: Arc::new(PreviewRegistry::new()),
            profile: Profile::default(),
        }
    }

    pub fn composer(&self) -> Composer {
        Composer::new(self.previews.clone())
    }

    /// A feed view scoped to one request
    pub fn feed_view(&self) -> FeedView {
        FeedView::new(self.repo.clone(), self.composer())
    }
}
