//! Best-effort replication of ledger changes to a remote sync service.
//!
//! Changes are not sent inline with the request that caused them. Each
//! mutation enqueues an event row in the same SQL transaction as the ledger
//! write, and a background worker drains the queue later. Delivery is
//! at-least-once: a failed delivery leaves the event queued with its attempt
//! count bumped, and no sync outcome is ever surfaced to the caller that
//! made the original change.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::OffsetDateTime;

use crate::Error;

/// Alias for the integer type used for sync event ids.
pub type SyncEventId = i64;

/// A queued change waiting to be delivered to the sync service.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    /// The id for the event.
    pub id: SyncEventId,
    /// The kind of change, e.g. "transaction.created".
    pub event_type: String,
    /// The changed record serialized as JSON.
    pub payload: String,
    /// When the event was enqueued.
    pub created_at: OffsetDateTime,
    /// How many delivery attempts have failed so far.
    pub attempts: i64,
}

/// The error returned when a sink could not deliver an event.
#[derive(Debug, thiserror::Error)]
#[error("could not deliver sync event: {0}")]
pub struct SyncError(pub String);

/// A destination for sync events.
///
/// Implementations must tolerate receiving the same event more than once:
/// the worker re-delivers anything that was not confirmed.
pub trait SyncSink {
    /// Deliver a single event.
    fn deliver(&self, event: &SyncEvent) -> Result<(), SyncError>;
}

/// A sink that records events in the application log instead of sending
/// them anywhere. Stands in for a real remote service.
#[derive(Debug, Default)]
pub struct TracingSink;

impl SyncSink for TracingSink {
    fn deliver(&self, event: &SyncEvent) -> Result<(), SyncError> {
        tracing::info!(
            event_id = event.id,
            event_type = %event.event_type,
            "sync event delivered: {}",
            event.payload
        );

        Ok(())
    }
}

pub fn create_sync_outbox_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS sync_outbox (
            id INTEGER PRIMARY KEY,
            event_type TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            attempts INTEGER NOT NULL DEFAULT 0,
            delivered INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_sync_event(row: &Row) -> Result<SyncEvent, rusqlite::Error> {
    Ok(SyncEvent {
        id: row.get(0)?,
        event_type: row.get(1)?,
        payload: row.get(2)?,
        created_at: row.get(3)?,
        attempts: row.get(4)?,
    })
}

/// Enqueue a change for later delivery to the sync service.
///
/// Call this on the same connection (or SQL transaction) as the ledger
/// write it describes, so the event is committed or rolled back with it.
pub fn enqueue_sync_event(
    event_type: &str,
    payload: &impl Serialize,
    connection: &Connection,
) -> Result<(), Error> {
    let payload = serde_json::to_string(payload)
        .map_err(|error| Error::JsonSerializationError(error.to_string()))?;

    connection.execute(
        "INSERT INTO sync_outbox (event_type, payload, created_at) VALUES (?1, ?2, ?3)",
        params![event_type, payload, OffsetDateTime::now_utc()],
    )?;

    Ok(())
}

/// Get the queued events that have not been delivered yet, oldest first.
pub fn get_pending_sync_events(connection: &Connection) -> Result<Vec<SyncEvent>, Error> {
    connection
        .prepare(
            "SELECT id, event_type, payload, created_at, attempts
                FROM sync_outbox WHERE delivered = 0 ORDER BY id",
        )?
        .query_map([], map_row_to_sync_event)?
        .map(|maybe_event| maybe_event.map_err(Error::from))
        .collect()
}

/// Attempt to deliver every pending event to `sink` and return the number
/// delivered.
///
/// Events the sink accepts are marked delivered. Events it rejects stay
/// queued with their attempt count incremented, to be retried on the next
/// drain. Sink failures are logged, never returned.
pub fn drain_outbox(sink: &dyn SyncSink, connection: &Connection) -> Result<usize, Error> {
    let pending = get_pending_sync_events(connection)?;
    let mut delivered_count = 0;

    for event in pending {
        match sink.deliver(&event) {
            Ok(()) => {
                connection.execute(
                    "UPDATE sync_outbox SET delivered = 1 WHERE id = ?1",
                    params![event.id],
                )?;
                delivered_count += 1;
            }
            Err(error) => {
                tracing::warn!(
                    event_id = event.id,
                    attempts = event.attempts + 1,
                    "sync delivery failed, event stays queued: {error}"
                );
                connection.execute(
                    "UPDATE sync_outbox SET attempts = attempts + 1 WHERE id = ?1",
                    params![event.id],
                )?;
            }
        }
    }

    Ok(delivered_count)
}

/// Drain the sync outbox on a fixed period until the process shuts down.
///
/// Intended to be spawned as a background task next to the HTTP server.
pub async fn run_sync_worker(
    db_connection: Arc<Mutex<Connection>>,
    sink: Arc<dyn SyncSink + Send + Sync>,
    period: std::time::Duration,
) {
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        let outcome = match db_connection.lock() {
            Ok(connection) => drain_outbox(sink.as_ref(), &connection),
            Err(error) => {
                tracing::error!("could not acquire database lock for sync: {error}");
                continue;
            }
        };

        match outcome {
            Ok(0) => {}
            Ok(delivered) => tracing::debug!("delivered {delivered} sync event(s)"),
            Err(error) => tracing::error!("could not drain sync outbox: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde::Serialize;

    use crate::db::initialize;

    use super::{
        SyncError, SyncEvent, SyncSink, TracingSink, drain_outbox, enqueue_sync_event,
        get_pending_sync_events,
    };

    #[derive(Serialize)]
    struct TestPayload {
        note: &'static str,
    }

    struct FailingSink;

    impl SyncSink for FailingSink {
        fn deliver(&self, _event: &SyncEvent) -> Result<(), SyncError> {
            Err(SyncError("remote unavailable".to_owned()))
        }
    }

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn enqueued_events_are_pending() {
        let connection = get_test_connection();

        enqueue_sync_event("transaction.created", &TestPayload { note: "hi" }, &connection)
            .unwrap();

        let pending = get_pending_sync_events(&connection).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event_type, "transaction.created");
        assert_eq!(pending[0].payload, "{\"note\":\"hi\"}");
        assert_eq!(pending[0].attempts, 0);
    }

    #[test]
    fn drained_events_are_marked_delivered() {
        let connection = get_test_connection();
        enqueue_sync_event("transaction.created", &TestPayload { note: "a" }, &connection)
            .unwrap();
        enqueue_sync_event("transaction.deleted", &TestPayload { note: "b" }, &connection)
            .unwrap();

        let delivered = drain_outbox(&TracingSink, &connection).unwrap();

        assert_eq!(delivered, 2);
        assert!(get_pending_sync_events(&connection).unwrap().is_empty());
    }

    #[test]
    fn failed_delivery_keeps_the_event_queued() {
        let connection = get_test_connection();
        enqueue_sync_event("transaction.created", &TestPayload { note: "a" }, &connection)
            .unwrap();

        let delivered = drain_outbox(&FailingSink, &connection).unwrap();

        assert_eq!(delivered, 0);
        let pending = get_pending_sync_events(&connection).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 1);

        // A later drain against a healthy sink clears it.
        let delivered = drain_outbox(&TracingSink, &connection).unwrap();
        assert_eq!(delivered, 1);
        assert!(get_pending_sync_events(&connection).unwrap().is_empty());
    }
}
