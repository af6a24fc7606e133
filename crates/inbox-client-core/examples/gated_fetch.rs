//! Gated fetch walkthrough
//!
//! Simulates an inbox client whose session handshake completes in the
//! background while the application is already issuing calls. Run with:
//!
//! ```bash
//! cargo run --example gated_fetch
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use inbox_client_core::{InboxError, InvocationGate, Session, SessionEvents, SessionOutcome};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("inbox_client_core=debug")
        .init();

    let events = SessionEvents::default();
    let gate = Arc::new(InvocationGate::new());
    let _subscription = gate.attach(&events);

    // Background handshake: settles 150ms after startup.
    let initializer = events.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        initializer.notify_initialize_resolved(SessionOutcome::Established(Session {
            id: Uuid::new_v4(),
            subscriber_id: "subscriber-demo".to_string(),
            token: "jwt-token".to_string(),
            unread_count: 2,
            created_at: Utc::now(),
        }));
    });

    // Both calls are issued before the handshake settles; the gate defers
    // them and replays them in order once the session is established.
    let unread = gate.run(|| async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok::<u64, InboxError>(2)
    });
    let archive = gate.run(|| async { Ok::<bool, InboxError>(true) });

    let (unread, archived) = tokio::join!(unread, archive);
    println!("unread count: {}", unread.expect("unread fetch failed"));
    println!("archived: {}", archived.expect("archive failed"));
    println!("session: {:?}", gate.session().await.map(|s| s.subscriber_id));
}
