use std::{collections::HashMap, sync::Arc};

use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;

/// Where the user currently is in the catalog tree. Callback data carries
/// only the last segment; the rest lives here.
#[derive(Clone, Debug, Default)]
pub(crate) struct Nav {
    pub department: Option<String>,
    pub semester: Option<String>,
    pub year: Option<String>,
}

/// Input the bot is waiting for from an admin.
#[derive(Clone, Debug)]
pub(crate) enum PendingAction {
    /// An `/uploadpaper` command was issued; the next document message
    /// provides the file whose id becomes the paper locator.
    PaperDocument {
        department: String,
        semester: String,
        year: String,
        name: String,
        price: Option<i64>,
    },
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Session {
    pub hub_message_id: Option<MessageId>,
    pub nav: Nav,
    pub pending: Option<PendingAction>,
}

#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    inner: Arc<Mutex<HashMap<ChatId, Session>>>,
}

impl SessionStore {
    pub(crate) async fn get(&self, chat_id: ChatId) -> Session {
        let guard = self.inner.lock().await;
        guard.get(&chat_id).cloned().unwrap_or_default()
    }

    pub(crate) async fn update<F>(&self, chat_id: ChatId, f: F) -> Session
    where
        F: FnOnce(&mut Session),
    {
        let mut guard = self.inner.lock().await;
        let session = guard.entry(chat_id).or_insert_with(Session::default);
        f(session);
        session.clone()
    }
}
