use super::error::{StoreError, StoreResult};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Opens connections for a [`ManagedConnection`].
pub trait Connector: Send + Sync {
    type Conn: Send;

    /// Open a fresh connection.
    ///
    /// # Errors
    ///
    /// Should return [`StoreError::Connection`] when the backend is unreachable.
    fn connect(&self) -> StoreResult<Self::Conn>;

    /// Short human-readable target, for logs.
    fn describe(&self) -> String;
}

/// Lifecycle of the single backend connection.
#[derive(Debug)]
pub enum ConnectionState<C> {
    Disconnected,
    Connected(C),
    Reconnecting,
}

impl<C> ConnectionState<C> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected(_) => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

/// Default number of reconnect attempts per operation.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// A lazily opened connection that reconnects once on connection failures.
///
/// Operations are serialized on the connection. When one fails with
/// [`StoreError::Connection`] the connection is dropped, reopened and the
/// operation is run again; a second failure is returned to the caller.
pub struct ManagedConnection<K: Connector> {
    connector: K,
    state: Mutex<ConnectionState<K::Conn>>,
    max_retries: u32,
}

impl<K: Connector> ManagedConnection<K> {
    pub fn new(connector: K) -> Self {
        Self::with_max_retries(connector, DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(connector: K, max_retries: u32) -> Self {
        Self {
            connector,
            state: Mutex::new(ConnectionState::Disconnected),
            max_retries,
        }
    }

    /// Connect immediately instead of on first use.
    ///
    /// # Errors
    ///
    /// The connector's error when the backend cannot be opened.
    pub fn connect_now(&self) -> StoreResult<()> {
        self.run(|_| Ok(()))
    }

    #[must_use]
    pub fn state_name(&self) -> &'static str {
        match self.state.lock() {
            Ok(state) => state.name(),
            Err(_) => "poisoned",
        }
    }

    /// Run `op` against a live connection.
    ///
    /// # Errors
    ///
    /// Whatever `op` or the connector returns once retries are exhausted.
    pub fn run<T>(&self, mut op: impl FnMut(&mut K::Conn) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Connection("connection mutex poisoned".to_string()))?;

        let mut attempt = 0;
        loop {
            let result = Self::ensure_connected(&self.connector, &mut state).and_then(&mut op);
            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_connection() => {
                    *state = ConnectionState::Disconnected;
                    if attempt >= self.max_retries {
                        warn!(
                            target_db = %self.connector.describe(),
                            attempts = attempt + 1,
                            error = %err,
                            "Store operation failed after reconnect"
                        );
                        return Err(err);
                    }
                    attempt += 1;
                    warn!(
                        target_db = %self.connector.describe(),
                        attempt,
                        error = %err,
                        "Store connection lost, reconnecting"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn ensure_connected<'a>(
        connector: &K,
        state: &'a mut ConnectionState<K::Conn>,
    ) -> StoreResult<&'a mut K::Conn> {
        if !matches!(state, ConnectionState::Connected(_)) {
            *state = ConnectionState::Reconnecting;
            match connector.connect() {
                Ok(conn) => {
                    info!(target_db = %connector.describe(), "Store connected");
                    *state = ConnectionState::Connected(conn);
                }
                Err(err) => {
                    debug!(target_db = %connector.describe(), error = %err, "Store connect failed");
                    *state = ConnectionState::Disconnected;
                    return Err(err);
                }
            }
        }
        match state {
            ConnectionState::Connected(conn) => Ok(conn),
            _ => Err(StoreError::Connection("not connected".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Connector whose connections count the operations run on them.
    struct FakeConnector {
        connects: Arc<AtomicUsize>,
        refuse_after: usize,
    }

    impl Connector for FakeConnector {
        type Conn = usize;

        fn connect(&self) -> StoreResult<usize> {
            let n = self.connects.fetch_add(1, Ordering::SeqCst);
            if n >= self.refuse_after {
                Err(StoreError::Connection("refused".into()))
            } else {
                Ok(n)
            }
        }

        fn describe(&self) -> String {
            "fake".into()
        }
    }

    fn managed(refuse_after: usize) -> (ManagedConnection<FakeConnector>, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let conn = ManagedConnection::new(FakeConnector {
            connects: Arc::clone(&connects),
            refuse_after,
        });
        (conn, connects)
    }

    #[test]
    fn test_connects_lazily_and_reuses() {
        let (conn, connects) = managed(usize::MAX);
        assert_eq!(conn.state_name(), "disconnected");
        assert_eq!(conn.run(|c| Ok(*c)).unwrap(), 0);
        assert_eq!(conn.run(|c| Ok(*c)).unwrap(), 0);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(conn.state_name(), "connected");
    }

    #[test]
    fn test_retries_once_on_connection_failure() {
        let (conn, connects) = managed(usize::MAX);
        let mut calls = 0;
        let out = conn.run(|c| {
            calls += 1;
            if calls == 1 {
                Err(StoreError::Connection("dropped".into()))
            } else {
                Ok(*c)
            }
        });
        assert_eq!(out.unwrap(), 1, "second connection was used");
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_gives_up_after_second_failure() {
        let (conn, _) = managed(usize::MAX);
        let mut calls = 0;
        let out: StoreResult<()> = conn.run(|_| {
            calls += 1;
            Err(StoreError::Connection("dropped".into()))
        });
        assert!(out.unwrap_err().is_connection());
        assert_eq!(calls, 2);
        assert_eq!(conn.state_name(), "disconnected");
    }

    #[test]
    fn test_query_errors_are_not_retried() {
        let (conn, connects) = managed(usize::MAX);
        let mut calls = 0;
        let out: StoreResult<()> = conn.run(|_| {
            calls += 1;
            Err(StoreError::Query("syntax".into()))
        });
        assert!(matches!(out, Err(StoreError::Query(_))));
        assert_eq!(calls, 1);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_connect_refused_twice_is_an_error() {
        let (conn, connects) = managed(0);
        assert!(conn.connect_now().unwrap_err().is_connection());
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }
}
