//! Bounded pool of authenticated sessions.
//!
//! One pool serves one (host, port, credentials) tuple. A checkout hands
//! exclusive use of a session to the caller until it is released; idle
//! sessions are probed for staleness before reuse. Capacity is reserved
//! before a new session is created so concurrent acquirers cannot
//! collectively overshoot the limit.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, oneshot};

use crate::error::{Error, Result};

/// Creates, probes, and disposes pooled sessions.
///
/// Implementations connect and authenticate in [`SessionFactory::connect`];
/// the pool never sees credentials.
pub trait SessionFactory: Send + Sync + 'static {
    /// The pooled session type.
    type Session: Send + 'static;

    /// Connects and authenticates a new session.
    fn connect(&self) -> impl Future<Output = Result<Self::Session>> + Send;

    /// Checks whether an idle session is still usable.
    fn probe(&self, session: &mut Self::Session) -> impl Future<Output = bool> + Send;

    /// Disposes of a session (best-effort logout/close).
    fn dispose(&self, session: Self::Session) -> impl Future<Output = ()> + Send;
}

struct PoolState<T> {
    idle: Vec<T>,
    in_use: usize,
    waiters: VecDeque<oneshot::Sender<T>>,
    closed: bool,
}

/// Bounded connection pool.
pub struct ConnectionPool<F: SessionFactory> {
    factory: Arc<F>,
    state: Arc<Mutex<PoolState<F::Session>>>,
    max_connections: usize,
}

impl<F: SessionFactory> Clone for ConnectionPool<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            state: Arc::clone(&self.state),
            max_connections: self.max_connections,
        }
    }
}

impl<F: SessionFactory> ConnectionPool<F> {
    /// Creates a pool bounded at `max_connections` concurrent sessions.
    #[must_use]
    pub fn new(factory: F, max_connections: usize) -> Self {
        Self {
            factory: Arc::new(factory),
            state: Arc::new(Mutex::new(PoolState {
                idle: Vec::new(),
                in_use: 0,
                waiters: VecDeque::new(),
                closed: false,
            })),
            max_connections: max_connections.max(1),
        }
    }

    /// Number of checked-out sessions.
    pub async fn in_use(&self) -> usize {
        self.state.lock().await.in_use
    }

    /// Number of idle sessions.
    pub async fn idle(&self) -> usize {
        self.state.lock().await.idle.len()
    }

    /// Number of queued waiters.
    pub async fn waiting(&self) -> usize {
        self.state.lock().await.waiters.len()
    }

    /// Checks out a session.
    ///
    /// Reuses a live idle session, creates a new one when capacity
    /// remains, or queues until a release hands one over.
    ///
    /// # Errors
    ///
    /// Returns `PoolClosed` when the pool is (or becomes) closed, or the
    /// factory's error when creating a fresh session fails.
    pub async fn acquire(&self) -> Result<F::Session> {
        loop {
            let candidate = {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(Error::PoolClosed);
                }

                if let Some(session) = state.idle.pop() {
                    // Count the candidate as in use while it is probed, so
                    // concurrent acquirers cannot overshoot capacity.
                    state.in_use += 1;
                    Some(session)
                } else if state.in_use + state.idle.len() < self.max_connections {
                    // Reserve the slot before creating, so N concurrent
                    // acquirers cannot all start connecting at once.
                    state.in_use += 1;
                    None
                } else {
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push_back(tx);
                    drop(state);
                    return match rx.await {
                        Ok(session) => Ok(session),
                        Err(_) => Err(Error::PoolClosed),
                    };
                }
            };

            match candidate {
                Some(mut session) => {
                    // Idle sessions may have gone stale while parked.
                    if self.factory.probe(&mut session).await {
                        return Ok(session);
                    }
                    tracing::debug!("discarding stale pooled session");
                    self.state.lock().await.in_use -= 1;
                    self.factory.dispose(session).await;
                    // Loop to reconsider with fresh state.
                }
                None => {
                    match self.factory.connect().await {
                        Ok(session) => return Ok(session),
                        Err(e) => {
                            let mut state = self.state.lock().await;
                            state.in_use -= 1;
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Returns a session to the pool.
    ///
    /// A queued waiter receives the session directly; otherwise it parks
    /// as idle, or is disposed when the pool is closed.
    pub async fn release(&self, session: F::Session) {
        let leftover = {
            let mut state = self.state.lock().await;
            state.in_use = state.in_use.saturating_sub(1);

            if state.closed {
                Some(session)
            } else {
                let mut session = session;
                loop {
                    match state.waiters.pop_front() {
                        Some(waiter) => {
                            state.in_use += 1;
                            match waiter.send(session) {
                                Ok(()) => break None,
                                Err(returned) => {
                                    // Waiter gave up; undo and try the next.
                                    state.in_use -= 1;
                                    session = returned;
                                }
                            }
                        }
                        None => {
                            state.idle.push(session);
                            break None;
                        }
                    }
                }
            }
        };

        if let Some(session) = leftover {
            self.factory.dispose(session).await;
        }
    }

    /// Discards a session the caller knows to be broken, freeing its slot.
    pub async fn discard(&self, session: F::Session) {
        {
            let mut state = self.state.lock().await;
            state.in_use = state.in_use.saturating_sub(1);
        }
        self.factory.dispose(session).await;
    }

    /// Closes the pool: rejects all waiters and disposes idle sessions.
    pub async fn close(&self) {
        let idle = {
            let mut state = self.state.lock().await;
            state.closed = true;
            // Dropping the senders resolves every waiter with PoolClosed.
            state.waiters.clear();
            std::mem::take(&mut state.idle)
        };

        for session in idle {
            self.factory.dispose(session).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct FakeSession {
        id: u32,
        alive: bool,
    }

    struct FakeFactory {
        created: AtomicU32,
        disposed: AtomicU32,
        fail_connect: AtomicBool,
        probe_result: AtomicBool,
    }

    impl FakeFactory {
        fn new() -> Self {
            Self {
                created: AtomicU32::new(0),
                disposed: AtomicU32::new(0),
                fail_connect: AtomicBool::new(false),
                probe_result: AtomicBool::new(true),
            }
        }
    }

    impl SessionFactory for FakeFactory {
        type Session = FakeSession;

        async fn connect(&self) -> Result<FakeSession> {
            if self.fail_connect.load(Ordering::SeqCst) {
                return Err(Error::ConnectionFailed("refused".into()));
            }
            let id = self.created.fetch_add(1, Ordering::SeqCst);
            Ok(FakeSession { id, alive: true })
        }

        async fn probe(&self, session: &mut FakeSession) -> bool {
            session.alive && self.probe_result.load(Ordering::SeqCst)
        }

        async fn dispose(&self, _session: FakeSession) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn acquire_creates_then_reuses() {
        let pool = ConnectionPool::new(FakeFactory::new(), 2);

        let session = pool.acquire().await.unwrap();
        assert_eq!(session.id, 0);
        assert_eq!(pool.in_use().await, 1);

        pool.release(session).await;
        assert_eq!(pool.in_use().await, 0);
        assert_eq!(pool.idle().await, 1);

        let session = pool.acquire().await.unwrap();
        assert_eq!(session.id, 0, "idle session should be reused");
        pool.release(session).await;
    }

    #[tokio::test]
    async fn stale_idle_sessions_are_replaced() {
        let pool = ConnectionPool::new(FakeFactory::new(), 2);

        let mut session = pool.acquire().await.unwrap();
        session.alive = false;
        pool.release(session).await;
        assert_eq!(pool.idle().await, 1);

        let session = pool.acquire().await.unwrap();
        assert_eq!(session.id, 1, "stale session should be discarded");
        pool.release(session).await;
    }

    #[tokio::test]
    async fn capacity_is_never_exceeded() {
        let pool = ConnectionPool::new(FakeFactory::new(), 2);
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_eq!(pool.in_use().await, 2);

        // Third acquire must queue.
        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move { pool2.acquire().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.waiting().await, 1);

        pool.release(a).await;
        let handed = waiter.await.unwrap().unwrap();
        assert_eq!(pool.in_use().await, 2);
        assert_eq!(pool.waiting().await, 0);

        pool.release(b).await;
        pool.release(handed).await;
        assert_eq!(pool.in_use().await, 0);
        assert_eq!(pool.waiting().await, 0);
    }

    #[tokio::test]
    async fn failed_connect_releases_reservation() {
        let factory = FakeFactory::new();
        factory.fail_connect.store(true, Ordering::SeqCst);
        let pool = ConnectionPool::new(factory, 1);

        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)));
        assert_eq!(pool.in_use().await, 0, "reservation must be rolled back");
    }

    #[tokio::test]
    async fn close_rejects_waiters_and_disposes_idle() {
        let pool = ConnectionPool::new(FakeFactory::new(), 1);
        let held = pool.acquire().await.unwrap();

        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move { pool2.acquire().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        pool.close().await;
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(Error::PoolClosed)));

        // Releasing after close disposes the session.
        pool.release(held).await;
        assert_eq!(pool.idle().await, 0);

        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, Error::PoolClosed));
    }

    #[tokio::test]
    async fn balanced_acquire_release_leaves_pool_quiescent() {
        let pool = ConnectionPool::new(FakeFactory::new(), 4);
        let total = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let pool = pool.clone();
            let total = Arc::clone(&total);
            handles.push(tokio::spawn(async move {
                for _ in 0..8 {
                    let session = pool.acquire().await.unwrap();
                    total.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    pool.release(session).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(total.load(Ordering::SeqCst), 128);
        assert_eq!(pool.in_use().await, 0);
        assert_eq!(pool.waiting().await, 0);
        assert!(pool.idle().await <= 4);
    }
}
