//! The event loop that drives an application.
//!
//! All widget, layout and registry work happens on the thread running the
//! [`EventLoop`]. Other threads hand work to it through an
//! [`EventLoopProxy`], which queues closures to run on the loop's thread in
//! the order they were posted.

use std::cell::Cell;
use std::fmt::{self, Debug};
use std::sync::mpsc;
use std::time::{Duration, Instant};

type Task = Box<dyn FnOnce() + Send>;

enum LoopMessage {
    Task(Task),
    Exit,
}

/// The event loop has exited and no longer accepts tasks.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("the event loop is no longer running")]
pub struct EventLoopClosed;

/// A single-threaded queue of tasks.
pub struct EventLoop {
    sender: mpsc::Sender<LoopMessage>,
    receiver: mpsc::Receiver<LoopMessage>,
    exit_requested: Cell<bool>,
}

impl EventLoop {
    /// Returns a new, empty event loop.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            exit_requested: Cell::new(false),
        }
    }

    /// Returns a handle that can post tasks to this loop from any thread.
    #[must_use]
    pub fn proxy(&self) -> EventLoopProxy {
        EventLoopProxy {
            sender: self.sender.clone(),
        }
    }

    /// Returns true once an exit has been requested through a proxy.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested.get()
    }

    /// Runs tasks until an exit is requested.
    pub fn run(&self) {
        while !self.exit_requested.get() {
            // The loop holds a sender, so the channel can never disconnect.
            let Ok(message) = self.receiver.recv() else {
                break;
            };
            self.handle(message);
        }
    }

    /// Runs every task that is already queued without waiting for more, and
    /// returns the number of tasks executed.
    pub fn run_pending(&self) -> usize {
        let mut executed = 0;
        while !self.exit_requested.get() {
            let Ok(message) = self.receiver.try_recv() else {
                break;
            };
            executed += usize::from(self.handle(message));
        }
        executed
    }

    /// Runs tasks until `condition` returns true, an exit is requested, or
    /// `timeout` elapses. Returns the final result of `condition`.
    pub fn run_until<F>(&self, timeout: Duration, mut condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if condition() {
                return true;
            }
            if self.exit_requested.get() {
                return false;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            match self.receiver.recv_timeout(remaining) {
                Ok(message) => {
                    self.handle(message);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => return condition(),
                Err(mpsc::RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn handle(&self, message: LoopMessage) -> bool {
        match message {
            LoopMessage::Task(task) => {
                task();
                true
            }
            LoopMessage::Exit => {
                tracing::debug!("event loop exit requested");
                self.exit_requested.set(true);
                false
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("exit_requested", &self.exit_requested.get())
            .finish_non_exhaustive()
    }
}

/// A handle for posting work to an [`EventLoop`].
#[derive(Clone, Debug)]
pub struct EventLoopProxy {
    sender: mpsc::Sender<LoopMessage>,
}

impl EventLoopProxy {
    /// Queues `task` to run on the event loop's thread.
    ///
    /// # Errors
    ///
    /// Returns [`EventLoopClosed`] if the event loop has been dropped.
    pub fn post<F>(&self, task: F) -> Result<(), EventLoopClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(LoopMessage::Task(Box::new(task)))
            .map_err(|_| EventLoopClosed)
    }

    /// Asks the event loop to stop once it reaches this request.
    ///
    /// # Errors
    ///
    /// Returns [`EventLoopClosed`] if the event loop has been dropped.
    pub fn exit(&self) -> Result<(), EventLoopClosed> {
        self.sender
            .send(LoopMessage::Exit)
            .map_err(|_| EventLoopClosed)
    }
}

impl Debug for LoopMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopMessage::Task(_) => f.write_str("Task"),
            LoopMessage::Exit => f.write_str("Exit"),
        }
    }
}

#[cfg(feature = "requests")]
mod tokio {
    use std::future::Future;
    use std::io;
    use std::ops::Deref;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::thread;

    use tokio::runtime::{self, Handle};

    /// A `tokio` runtime running on its own thread.
    ///
    /// Network requests are spawned here so that the event loop never waits
    /// on I/O.
    #[derive(Debug, Clone)]
    pub struct TokioRuntime {
        pub(crate) handle: Handle,
    }

    impl TokioRuntime {
        /// Starts a current-thread runtime on a dedicated thread named
        /// `tokio`.
        ///
        /// # Errors
        ///
        /// Returns an error if the runtime or its thread cannot be created.
        pub fn spawn() -> io::Result<Self> {
            let runtime = runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let handle = runtime.handle().clone();
            thread::Builder::new()
                .name(String::from("tokio"))
                .spawn(move || {
                    runtime.block_on(BlockForever);
                })?;
            Ok(Self { handle })
        }
    }

    impl From<Handle> for TokioRuntime {
        fn from(handle: Handle) -> Self {
            Self { handle }
        }
    }

    impl Deref for TokioRuntime {
        type Target = Handle;

        fn deref(&self) -> &Self::Target {
            &self.handle
        }
    }

    struct BlockForever;
    impl Future for BlockForever {
        type Output = ();

        fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
            Poll::<()>::Pending
        }
    }
}

#[cfg(feature = "requests")]
pub use tokio::TokioRuntime;
