//! One-shot notifications.
//!
//! A flash is pushed into the session by the handler that performed an
//! action and drained by the next page that renders, usually right after a
//! redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS modifier used by the layout.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash--success",
            Self::Error => "flash--error",
            Self::Info => "flash--info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    /// Queue a message for the next rendered page.
    ///
    /// Failing to store a flash only loses the notification, so errors are
    /// logged and swallowed.
    pub async fn push(session: &Session, kind: FlashKind, message: impl Into<String>) {
        let mut pending = session
            .get::<Vec<Self>>(keys::FLASH)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        pending.push(Self {
            kind,
            message: message.into(),
        });
        if let Err(e) = session.insert(keys::FLASH, pending).await {
            tracing::warn!(error = %e, "Failed to store flash message");
        }
    }

    pub async fn success(session: &Session, message: impl Into<String>) {
        Self::push(session, FlashKind::Success, message).await;
    }

    pub async fn error(session: &Session, message: impl Into<String>) {
        Self::push(session, FlashKind::Error, message).await;
    }

    pub async fn info(session: &Session, message: impl Into<String>) {
        Self::push(session, FlashKind::Info, message).await;
    }

    /// Remove and return every pending message.
    pub async fn drain(session: &Session) -> Vec<Self> {
        session
            .remove::<Vec<Self>>(keys::FLASH)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flashes_are_shown_once_in_order() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        Flash::success(&session, "Producto añadido").await;
        Flash::error(&session, "Sin stock").await;

        let shown = Flash::drain(&session).await;
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].kind, FlashKind::Success);
        assert_eq!(shown[1].message, "Sin stock");

        assert!(Flash::drain(&session).await.is_empty());
    }
}
