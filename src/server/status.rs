//! Connection statistics for the `/status` health page

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    serve::Listener,
};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Counters shared by the listener, the request middleware and the
/// status handler
#[derive(Debug, Default)]
pub struct StatusCounters {
    accepts: AtomicU64,
    handled: AtomicU64,
    requests: AtomicU64,
    active: AtomicU64,
    writing: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub active: u64,
    pub accepts: u64,
    pub handled: u64,
    pub requests: u64,
    pub reading: u64,
    pub writing: u64,
    pub waiting: u64,
}

impl StatusCounters {
    pub fn snapshot(&self) -> StatusSnapshot {
        let active = self.active.load(Ordering::Relaxed);
        let writing = self.writing.load(Ordering::Relaxed);
        // Request headers are parsed inside hyper, so reading is not observable
        let reading = 0;
        StatusSnapshot {
            active,
            accepts: self.accepts.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            reading,
            writing,
            waiting: active.saturating_sub(reading + writing),
        }
    }

    fn connection_opened(self: &Arc<Self>) -> ConnectionGuard {
        self.accepts.fetch_add(1, Ordering::Relaxed);
        self.handled.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            counters: Arc::clone(self),
        }
    }

    fn request_started(self: &Arc<Self>) -> RequestGuard {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.writing.fetch_add(1, Ordering::Relaxed);
        RequestGuard {
            counters: Arc::clone(self),
        }
    }
}

impl StatusSnapshot {
    /// Render in the layout health checks already parse
    pub fn render(&self) -> String {
        format!(
            "Active connections: {} \nserver accepts handled requests\n {} {} {} \nReading: {} Writing: {} Waiting: {} \n",
            self.active,
            self.accepts,
            self.handled,
            self.requests,
            self.reading,
            self.writing,
            self.waiting,
        )
    }
}

#[derive(Debug)]
struct ConnectionGuard {
    counters: Arc<StatusCounters>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct RequestGuard {
    counters: Arc<StatusCounters>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.counters.writing.fetch_sub(1, Ordering::Relaxed);
    }
}

/// `GET /status`
pub async fn status_page(State(counters): State<Arc<StatusCounters>>) -> String {
    counters.snapshot().render()
}

/// Middleware counting every request and the ones still in flight
pub async fn count_requests(
    State(counters): State<Arc<StatusCounters>>,
    request: Request,
    next: Next,
) -> Response {
    let _in_flight = counters.request_started();
    next.run(request).await
}

/// Listener wrapper counting accepted and open connections
#[derive(Debug)]
pub struct CountingListener<L> {
    inner: L,
    counters: Arc<StatusCounters>,
}

impl<L> CountingListener<L> {
    pub fn new(inner: L, counters: Arc<StatusCounters>) -> Self {
        Self { inner, counters }
    }
}

impl<L: Listener> Listener for CountingListener<L> {
    type Io = CountedStream<L::Io>;
    type Addr = L::Addr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        let (io, addr) = self.inner.accept().await;
        let guard = self.counters.connection_opened();
        (CountedStream { inner: io, _guard: guard }, addr)
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

/// Connection stream that marks itself closed when dropped
#[derive(Debug)]
pub struct CountedStream<S> {
    inner: S,
    _guard: ConnectionGuard,
}

impl<S: AsyncRead + Unpin> AsyncRead for CountedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for CountedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_layout() {
        let snapshot = StatusSnapshot {
            active: 2,
            accepts: 16,
            handled: 16,
            requests: 31,
            reading: 0,
            writing: 1,
            waiting: 1,
        };
        assert_eq!(
            snapshot.render(),
            "Active connections: 2 \nserver accepts handled requests\n 16 16 31 \nReading: 0 Writing: 1 Waiting: 1 \n"
        );
    }

    #[test]
    fn test_connection_guard_tracks_active() {
        let counters = Arc::new(StatusCounters::default());
        let first = counters.connection_opened();
        let second = counters.connection_opened();
        assert_eq!(counters.snapshot().active, 2);

        drop(first);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.active, 1);
        assert_eq!(snapshot.accepts, 2);
        assert_eq!(snapshot.handled, 2);
        drop(second);
        assert_eq!(counters.snapshot().active, 0);
    }

    #[test]
    fn test_request_guard_tracks_writing() {
        let counters = Arc::new(StatusCounters::default());
        let _conn = counters.connection_opened();
        let request = counters.request_started();
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.writing, 1);
        assert_eq!(snapshot.waiting, 0);

        drop(request);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.writing, 0);
        assert_eq!(snapshot.waiting, 1);
    }

    #[tokio::test]
    async fn test_counted_stream_delegates_and_releases() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let counters = Arc::new(StatusCounters::default());
        let io = tokio_test::io::Builder::new()
            .read(b"GET /")
            .write(b"HTTP/1.1")
            .build();
        let mut stream = CountedStream {
            inner: io,
            _guard: counters.connection_opened(),
        };

        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"GET /");
        stream.write_all(b"HTTP/1.1").await.unwrap();
        assert_eq!(counters.snapshot().active, 1);

        drop(stream);
        assert_eq!(counters.snapshot().active, 0);
    }

    #[test]
    fn test_waiting_never_underflows() {
        // Requests driven without a counted connection, as in router tests
        let counters = Arc::new(StatusCounters::default());
        let _request = counters.request_started();
        assert_eq!(counters.snapshot().waiting, 0);
    }
}
