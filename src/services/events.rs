//! Background task that writes auth events to the application log.

use serde_json::json;
use tokio::task::JoinHandle;

use super::auth_context::{AuthEvent, AuthSubscription};
use crate::logging::Logger;

/// Log every event from `subscription` until the auth context is gone.
pub fn spawn_event_log(mut subscription: AuthSubscription, logger: Logger) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            record(&logger, &event);
        }
    })
}

fn record(logger: &Logger, event: &AuthEvent) {
    match event {
        AuthEvent::SignedIn { user_id } => logger.info("auth: signed in", Some(&json!({ "userId": user_id }))),
        AuthEvent::SignedOut => logger.info("auth: signed out", None),
        AuthEvent::SessionRefreshed => logger.debug("auth: session refreshed", None),
        AuthEvent::ApiStatusChanged { is_up: true } => logger.info("backend API reachable", None),
        AuthEvent::ApiStatusChanged { is_up: false } => logger.warn("backend API disconnected", None),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logging::file_sink::{ALL_LOG, FileSink};
    use crate::logging::Level;
    use crate::services::auth_context::AuthContext;
    use crate::state::test_helpers::{GOOD_PASSWORD, MockBackend, MockMode};

    #[tokio::test]
    async fn events_are_logged_until_context_drops() {
        let dir = std::env::temp_dir().join(format!("portico-events-{}", std::process::id()));
        let logger = Logger::new(Level::Debug, Some(FileSink::open(&dir).unwrap()));
        let ctx = AuthContext::new(Arc::new(MockBackend::new(MockMode::Healthy)));

        let handle = spawn_event_log(ctx.subscribe(), logger);
        ctx.sign_in("ada@example.com", GOOD_PASSWORD).await.unwrap();
        ctx.sign_out("good-token").await.unwrap();
        drop(ctx);
        handle.await.unwrap();

        let contents = std::fs::read_to_string(dir.join(ALL_LOG)).unwrap();
        let messages: Vec<String> = contents
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["message"].to_string())
            .collect();
        assert_eq!(messages, vec!["\"auth: signed in\"", "\"auth: signed out\""]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
