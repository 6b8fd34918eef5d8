//! Typed events and the subscriptions that observe them.
//!
//! An [`Event`] delivers a payload to every connected callback, synchronously,
//! on the thread that emits it. Subscribing returns a [`CallbackHandle`]; the
//! callback stays connected until the handle is dropped, the callback reports
//! [`CallbackDisconnected`], or [`Event::disconnect_all()`] is called.

use std::fmt::{self, Debug};
use std::mem;
use std::ops::{Add, AddAssign};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use alot::{LotId, Lots};
use parking_lot::Mutex;
use tracing::warn;

/// A callback function is no longer connected to its source.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CallbackDisconnected;

type CallbackFunction<T> = dyn FnMut(T) -> Result<(), CallbackDisconnected> + Send;

struct Subscriber<T> {
    connected: Arc<AtomicBool>,
    callback: Arc<SubscriberCallback<T>>,
}

struct SubscriberCallback<T> {
    invoking_thread: Mutex<Option<ThreadId>>,
    function: Mutex<Box<CallbackFunction<T>>>,
}

/// Marks a callback as running on a thread until dropped.
struct InvokingThread<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> InvokingThread<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>, thread: ThreadId) -> Self {
        *slot.lock() = Some(thread);
        Self(slot)
    }
}

impl Drop for InvokingThread<'_> {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

impl<T> Subscriber<T> {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            connected: self.connected.clone(),
            callback: self.callback.clone(),
        }
    }
}

struct EventData<T> {
    subscribers: Mutex<Lots<Subscriber<T>>>,
}

trait SubscriberCollection: Send + Sync + 'static {
    fn remove(&self, id: LotId);
}

impl<T> SubscriberCollection for EventData<T>
where
    T: Send + 'static,
{
    fn remove(&self, id: LotId) {
        if let Some(subscriber) = self.subscribers.lock().remove(id) {
            subscriber.disconnect();
        }
    }
}

/// A notification that carries a `T` to all connected callbacks.
///
/// Cloning an event produces another handle to the same set of subscribers.
pub struct Event<T> {
    data: Arc<EventData<T>>,
}

impl<T> Event<T>
where
    T: Clone + Send + 'static,
{
    /// Returns a new event with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(EventData {
                subscribers: Mutex::new(Lots::new()),
            }),
        }
    }

    /// Invokes `callback` each time this event is emitted.
    ///
    /// The callback is disconnected when the returned handle is dropped,
    /// unless [`CallbackHandle::persist()`] is called.
    pub fn subscribe<F>(&self, mut callback: F) -> CallbackHandle
    where
        F: FnMut(T) + Send + 'static,
    {
        self.subscribe_try(move |value| {
            callback(value);
            Ok(())
        })
    }

    /// Invokes `callback` each time this event is emitted.
    ///
    /// Returning `Err(CallbackDisconnected)` will prevent the callback from
    /// being invoked again.
    pub fn subscribe_try<F>(&self, callback: F) -> CallbackHandle
    where
        F: FnMut(T) -> Result<(), CallbackDisconnected> + Send + 'static,
    {
        let connected = Arc::new(AtomicBool::new(true));
        let id = self.data.subscribers.lock().push(Subscriber {
            connected: connected.clone(),
            callback: Arc::new(SubscriberCallback {
                invoking_thread: Mutex::new(None),
                function: Mutex::new(Box::new(callback)),
            }),
        });
        CallbackHandle(CallbackHandleInner::Single(CallbackHandleData {
            id: Some(id),
            connected,
            callbacks: self.data.clone(),
        }))
    }

    /// Delivers `value` to every connected callback and returns the number of
    /// callbacks invoked.
    ///
    /// The subscriber list is not locked while callbacks run, so callbacks may
    /// subscribe, unsubscribe or disconnect this event. A callback that is
    /// disconnected before its turn is skipped.
    ///
    /// A callback that causes its own event to be emitted again on the same
    /// thread is not invoked by the nested emission. Emissions from other
    /// threads wait for the callback to finish and then invoke it.
    pub fn emit(&self, value: T) -> usize {
        let subscribers = self
            .data
            .subscribers
            .lock()
            .iter()
            .cloned()
            .collect::<Vec<_>>();

        let current = thread::current().id();
        let mut invoked = 0;
        let mut any_disconnected = false;
        for subscriber in subscribers {
            if !subscriber.is_connected() {
                continue;
            }
            if *subscriber.callback.invoking_thread.lock() == Some(current) {
                warn!("skipping re-entrant event callback");
                continue;
            }
            let mut function = subscriber.callback.function.lock();
            // Another thread may have disconnected it while we waited.
            if !subscriber.is_connected() {
                continue;
            }
            let _invoking = InvokingThread::enter(&subscriber.callback.invoking_thread, current);
            invoked += 1;
            if (&mut **function)(value.clone()).is_err() {
                subscriber.disconnect();
                any_disconnected = true;
            }
        }

        if any_disconnected {
            self.data
                .subscribers
                .lock()
                .drain_filter(|subscriber| !subscriber.is_connected());
        }

        invoked
    }

    /// Disconnects every callback subscribed to this event.
    pub fn disconnect_all(&self) {
        // Draining in place keeps outstanding handles from removing
        // subscribers added later.
        self.data.subscribers.lock().drain_filter(|subscriber| {
            subscriber.disconnect();
            true
        });
    }

    /// Returns the number of connected callbacks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.data.subscribers.lock().len()
    }
}

impl<T> Default for Event<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<T> Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.data.subscribers.lock().len())
            .finish()
    }
}

/// A handle to one or more callbacks subscribed to an [`Event`].
///
/// Dropping this handle disconnects the callbacks.
#[must_use = "dropping a CallbackHandle disconnects its callbacks"]
pub struct CallbackHandle(CallbackHandleInner);

impl Default for CallbackHandle {
    fn default() -> Self {
        Self(CallbackHandleInner::None)
    }
}

enum CallbackHandleInner {
    None,
    Single(CallbackHandleData),
    Multi(Vec<CallbackHandleData>),
}

struct CallbackHandleData {
    id: Option<LotId>,
    connected: Arc<AtomicBool>,
    callbacks: Arc<dyn SubscriberCollection>,
}

impl CallbackHandleData {
    fn persist(mut self) {
        let _id = self.id.take();
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Drop for CallbackHandleData {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            self.callbacks.remove(id);
        }
    }
}

impl CallbackHandle {
    /// Persists the callbacks so that they are invoked until their event is
    /// disconnected or dropped.
    pub fn persist(self) {
        match self.0 {
            CallbackHandleInner::None => {}
            CallbackHandleInner::Single(handle) => handle.persist(),
            CallbackHandleInner::Multi(handles) => {
                for handle in handles {
                    handle.persist();
                }
            }
        }
    }

    /// Returns true if any callback tracked by this handle is still connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        match &self.0 {
            CallbackHandleInner::None => false,
            CallbackHandleInner::Single(handle) => handle.is_connected(),
            CallbackHandleInner::Multi(handles) => {
                handles.iter().any(CallbackHandleData::is_connected)
            }
        }
    }
}

impl Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("CallbackHandle");
        match &self.0 {
            CallbackHandleInner::None => {}
            CallbackHandleInner::Single(handle) => {
                tuple.field(&handle.id);
            }
            CallbackHandleInner::Multi(handles) => {
                for handle in handles {
                    tuple.field(&handle.id);
                }
            }
        }

        tuple.finish()
    }
}

impl Add for CallbackHandle {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for CallbackHandle {
    fn add_assign(&mut self, rhs: Self) {
        match (&mut self.0, rhs.0) {
            (_, CallbackHandleInner::None) => {}
            (CallbackHandleInner::None, other) => {
                self.0 = other;
            }
            (CallbackHandleInner::Single(_), CallbackHandleInner::Single(other)) => {
                let CallbackHandleInner::Single(this) =
                    mem::replace(&mut self.0, CallbackHandleInner::None)
                else {
                    unreachable!("just matched")
                };
                self.0 = CallbackHandleInner::Multi(vec![this, other]);
            }
            (CallbackHandleInner::Single(_), CallbackHandleInner::Multi(mut multi)) => {
                let CallbackHandleInner::Single(this) =
                    mem::replace(&mut self.0, CallbackHandleInner::None)
                else {
                    unreachable!("just matched")
                };
                multi.push(this);
                self.0 = CallbackHandleInner::Multi(multi);
            }
            (CallbackHandleInner::Multi(this), CallbackHandleInner::Single(other)) => {
                this.push(other);
            }
            (CallbackHandleInner::Multi(this), CallbackHandleInner::Multi(mut other)) => {
                this.append(&mut other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::{CallbackDisconnected, CallbackHandle, Event};

    #[test]
    fn emits_to_every_subscriber() {
        let event = Event::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _first = event.subscribe({
            let seen = seen.clone();
            move |value| seen.lock().push(("first", value))
        });
        let _second = event.subscribe({
            let seen = seen.clone();
            move |value| seen.lock().push(("second", value))
        });

        assert_eq!(event.emit(7), 2);
        assert_eq!(*seen.lock(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn dropping_handle_disconnects() {
        let event = Event::<()>::new();
        let count = Arc::new(Mutex::new(0));
        let handle = event.subscribe({
            let count = count.clone();
            move |()| *count.lock() += 1
        });
        event.emit(());
        assert!(handle.is_connected());
        drop(handle);

        assert_eq!(event.emit(()), 0);
        assert_eq!(*count.lock(), 1);
        assert_eq!(event.subscriber_count(), 0);
    }

    #[test]
    fn persisted_callbacks_survive_handle() {
        let event = Event::<()>::new();
        let count = Arc::new(Mutex::new(0));
        event
            .subscribe({
                let count = count.clone();
                move |()| *count.lock() += 1
            })
            .persist();

        event.emit(());
        event.emit(());
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn callback_can_disconnect_itself() {
        let event = Event::<u8>::new();
        let handle = event.subscribe_try(|value| {
            if value > 1 {
                Err(CallbackDisconnected)
            } else {
                Ok(())
            }
        });

        assert_eq!(event.emit(1), 1);
        assert_eq!(event.emit(2), 1);
        assert_eq!(event.emit(3), 0);
        assert!(!handle.is_connected());
    }

    #[test]
    fn disconnect_all_during_emit_skips_remaining() {
        let event = Event::<()>::new();
        let later_invoked = Arc::new(Mutex::new(false));
        let _first = event.subscribe({
            let event = event.clone();
            move |()| event.disconnect_all()
        });
        let second = event.subscribe({
            let later_invoked = later_invoked.clone();
            move |()| *later_invoked.lock() = true
        });

        assert_eq!(event.emit(()), 1);
        assert!(!*later_invoked.lock());
        assert!(!second.is_connected());
        assert_eq!(event.subscriber_count(), 0);
    }

    #[test]
    fn combined_handles() {
        let event = Event::<()>::new();
        let mut handles = CallbackHandle::default();
        assert!(!handles.is_connected());
        handles += event.subscribe(|()| {});
        handles += event.subscribe(|()| {});
        handles += event.subscribe(|()| {});
        assert_eq!(event.subscriber_count(), 3);
        assert!(handles.is_connected());

        drop(handles);
        assert_eq!(event.subscriber_count(), 0);
    }

    #[test]
    fn reentrant_emit_skips_running_callback() {
        let event = Event::<u8>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _handle = event.subscribe({
            let event = event.clone();
            let seen = seen.clone();
            move |value| {
                seen.lock().push(value);
                if value == 0 {
                    assert_eq!(event.emit(1), 0);
                }
            }
        });

        assert_eq!(event.emit(0), 1);
        assert_eq!(*seen.lock(), [0]);
    }

    #[test]
    fn overlapping_emits_from_other_threads_are_delivered() {
        let event = Event::<()>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _handle = event.subscribe({
            let calls = calls.clone();
            move |()| {
                calls.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(100));
            }
        });

        let first = thread::spawn({
            let event = event.clone();
            move || event.emit(())
        });
        while calls.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(event.emit(()), 1);
        assert_eq!(first.join().expect("emitting thread panicked"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
