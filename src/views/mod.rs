pub mod chat;
pub mod location;
pub mod prompts;

pub use chat::ChatView;
pub use location::LocationPromptView;
pub use prompts::{KeyPromptView, NoticeToast};

use crate::page::ChatPage;
use std::sync::Arc;

/// Shared page handle usable as a component prop.
#[derive(Clone)]
pub struct PageHandle(pub Arc<ChatPage>);

impl PartialEq for PageHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
