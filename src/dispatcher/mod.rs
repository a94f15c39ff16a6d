//! UI-affinity dispatcher.
//!
//! GUI toolkits only allow windows to be touched from the thread that owns
//! them. A [`Dispatcher`] is a cloneable handle to that thread's task queue;
//! the matching [`DispatchLoop`] drains it on the thread that created it.
//!
//! ```text
//!  any thread                               UI thread
//! ┌───────────┐  invoke / post    ┌──────────────────────────┐
//! │ Dispatcher├──────────────────►│ DispatchLoop::run        │
//! └─────▲─────┘                   │   └─ push_frame (dialogs)│
//!       └───── reply (invoke) ────┴──────────────────────────┘
//! ```
//!
//! Calls made on the UI thread itself run inline, so code reacting to UI
//! input can navigate without deadlocking on its own queue.

mod error;
mod frame;
mod ui_thread;

pub use error::DispatchError;
pub use frame::DispatchFrame;
pub use ui_thread::UiThread;

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::config::DispatcherConfig;

/// How often a nested frame re-checks whether it was exited from another thread.
const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(50);

type Task = Box<dyn FnOnce() + Send + 'static>;
type TaskOutcome<R> = Result<R, Box<dyn Any + Send + 'static>>;

enum DispatchMessage {
    Run(Task),
    Shutdown,
}

/// Handle for submitting work to the UI thread.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Held while checking `shut_down` and sending, so nothing can be queued
    /// behind the shutdown message.
    sender: Mutex<Sender<DispatchMessage>>,
    /// Taken (and dropped) when the loop stops, which disconnects the queue.
    receiver: Mutex<Option<Receiver<DispatchMessage>>>,
    ui_thread: ThreadId,
    /// Set once shutdown is requested; new submissions are refused.
    shut_down: AtomicBool,
    /// Set when a nested frame consumed the shutdown message.
    exit_requested: AtomicBool,
    invoke_timeout: Option<Duration>,
}

/// The receiving half of a dispatcher, pinned to the UI thread.
pub struct DispatchLoop {
    dispatcher: Dispatcher,
    _not_send: PhantomData<*const ()>,
}

pub(crate) fn check_config(config: &DispatcherConfig) -> Result<(), DispatchError> {
    if config.thread_name.trim().is_empty() {
        return Err(DispatchError::InvalidArgument {
            message: "thread name must not be empty".to_string(),
        });
    }
    if config.invoke_timeout_ms == Some(0) {
        return Err(DispatchError::InvalidArgument {
            message: "invoke timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

impl Dispatcher {
    /// Create a dispatcher whose UI thread is the calling thread.
    ///
    /// The caller must drive the returned [`DispatchLoop`], either with
    /// [`DispatchLoop::run`] or by calling [`DispatchLoop::run_pending`]
    /// from its own event loop.
    pub fn new(config: &DispatcherConfig) -> Result<(Dispatcher, DispatchLoop), DispatchError> {
        check_config(config)?;

        let (sender, receiver) = mpsc::channel();
        let dispatcher = Dispatcher {
            inner: Arc::new(DispatcherInner {
                sender: Mutex::new(sender),
                receiver: Mutex::new(Some(receiver)),
                ui_thread: thread::current().id(),
                shut_down: AtomicBool::new(false),
                exit_requested: AtomicBool::new(false),
                invoke_timeout: config.invoke_timeout(),
            }),
        };
        let event_loop = DispatchLoop {
            dispatcher: dispatcher.clone(),
            _not_send: PhantomData,
        };
        Ok((dispatcher, event_loop))
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.inner.ui_thread
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Run `action` on the UI thread and wait for its result.
    ///
    /// Runs inline when already on the UI thread. A panic inside `action`
    /// is resumed on the calling thread.
    pub fn invoke<F, R>(&self, action: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_ui_thread() {
            return self.run_inline(action);
        }

        let (reply_tx, reply_rx) = mpsc::sync_channel::<TaskOutcome<R>>(1);
        self.submit(Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(action));
            let _ = reply_tx.send(outcome);
        }))?;

        let outcome = match self.inner.invoke_timeout {
            Some(timeout) => reply_rx.recv_timeout(timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => DispatchError::Timeout(timeout),
                RecvTimeoutError::Disconnected => DispatchError::NoUiThread,
            })?,
            None => reply_rx.recv().map_err(|_| DispatchError::NoUiThread)?,
        };

        match outcome {
            Ok(value) => Ok(value),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Async counterpart of [`invoke`](Self::invoke) for callers running on
    /// an async runtime, where blocking a worker thread is not acceptable.
    pub async fn invoke_async<F, R>(&self, action: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_ui_thread() {
            return self.run_inline(action);
        }

        let (reply_tx, reply_rx) = oneshot::channel::<TaskOutcome<R>>();
        self.submit(Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(action));
            let _ = reply_tx.send(outcome);
        }))?;

        let outcome = match self.inner.invoke_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, reply_rx).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(_)) => return Err(DispatchError::NoUiThread),
                Err(_) => return Err(DispatchError::Timeout(timeout)),
            },
            None => reply_rx.await.map_err(|_| DispatchError::NoUiThread)?,
        };

        match outcome {
            Ok(value) => Ok(value),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Queue `action` for the UI thread and return immediately.
    ///
    /// Always queues, even on the UI thread.
    pub fn post<F>(&self, action: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Box::new(action))
    }

    /// Run a nested loop on the UI thread until `frame` is exited.
    ///
    /// Modal windows use this to keep the UI responsive while their caller is
    /// blocked. Returns `NoUiThread` if shutdown arrives while the frame runs.
    pub fn push_frame(&self, frame: &DispatchFrame) -> Result<(), DispatchError> {
        if !self.is_ui_thread() {
            return Err(DispatchError::WrongThread);
        }

        tracing::trace!("Entering nested dispatch frame");
        while frame.is_running() {
            // An inner frame already consumed the shutdown message.
            if self.is_exiting() {
                return Err(DispatchError::NoUiThread);
            }
            match self.next_message(Some(FRAME_POLL_INTERVAL)) {
                Ok(DispatchMessage::Run(task)) => run_task(task),
                Ok(DispatchMessage::Shutdown) => {
                    self.inner.exit_requested.store(true, Ordering::SeqCst);
                    return Err(DispatchError::NoUiThread);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(DispatchError::NoUiThread),
            }
        }
        tracing::trace!("Leaving nested dispatch frame");
        Ok(())
    }

    /// Stop accepting work and ask the loop to exit.
    ///
    /// Work queued before this call still runs.
    pub fn shutdown(&self) {
        let sender = self.inner.sender.lock();
        if !self.inner.shut_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("Dispatcher shutdown requested");
            let _ = sender.send(DispatchMessage::Shutdown);
        }
    }

    /// True once a nested frame has seen the shutdown message; the loop
    /// stops after the task that is running now.
    pub(crate) fn is_exiting(&self) -> bool {
        self.inner.exit_requested.load(Ordering::SeqCst)
    }

    fn run_inline<F, R>(&self, action: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R,
    {
        if self.inner.receiver.lock().is_none() {
            return Err(DispatchError::NoUiThread);
        }
        Ok(action())
    }

    fn submit(&self, task: Task) -> Result<(), DispatchError> {
        let sender = self.inner.sender.lock();
        if self.is_shut_down() {
            return Err(DispatchError::NoUiThread);
        }
        sender
            .send(DispatchMessage::Run(task))
            .map_err(|_| DispatchError::NoUiThread)
    }

    fn next_message(&self, timeout: Option<Duration>) -> Result<DispatchMessage, RecvTimeoutError> {
        let guard = self.inner.receiver.lock();
        let Some(receiver) = guard.as_ref() else {
            return Err(RecvTimeoutError::Disconnected);
        };
        match timeout {
            Some(timeout) => receiver.recv_timeout(timeout),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        }
    }

    fn close(&self) {
        let receiver = {
            let _sender = self.inner.sender.lock();
            self.inner.shut_down.store(true, Ordering::SeqCst);
            self.inner.receiver.lock().take()
        };
        if receiver.is_some() {
            tracing::debug!("Dispatch loop stopped");
        }
        // Dropping the receiver discards queued tasks; blocked invokers see
        // their reply channel disconnect.
        drop(receiver);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("ui_thread", &self.inner.ui_thread)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl DispatchLoop {
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Drain the queue until shutdown.
    pub fn run(self) {
        tracing::debug!("Dispatch loop running");
        loop {
            match self.dispatcher.next_message(None) {
                Ok(DispatchMessage::Run(task)) => {
                    run_task(task);
                    if self.dispatcher.inner.exit_requested.load(Ordering::SeqCst) {
                        break;
                    }
                }
                Ok(DispatchMessage::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Run every task that is ready right now, without blocking.
    ///
    /// Meant for hosts that own their own event loop. Returns the number of
    /// tasks executed.
    pub fn run_pending(&self) -> usize {
        let mut handled = 0;
        loop {
            let message = {
                let guard = self.dispatcher.inner.receiver.lock();
                match guard.as_ref() {
                    Some(receiver) => receiver.try_recv(),
                    None => return handled,
                }
            };
            match message {
                Ok(DispatchMessage::Run(task)) => {
                    run_task(task);
                    handled += 1;
                    if self.dispatcher.inner.exit_requested.load(Ordering::SeqCst) {
                        self.dispatcher.close();
                        break;
                    }
                }
                Ok(DispatchMessage::Shutdown) => {
                    self.dispatcher.close();
                    break;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }
}

impl Drop for DispatchLoop {
    fn drop(&mut self) {
        self.dispatcher.close();
    }
}

fn run_task(task: Task) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        tracing::error!(panic = %panic_message(payload.as_ref()), "Posted UI task panicked");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn config() -> DispatcherConfig {
        DispatcherConfig {
            thread_name: "test-ui".to_string(),
            invoke_timeout_ms: None,
        }
    }

    #[test]
    fn invoke_runs_on_ui_thread() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        let name = dispatcher
            .invoke(|| thread::current().name().map(str::to_string))
            .expect("invoke");
        assert_eq!(name.as_deref(), Some("test-ui"));
        assert!(!dispatcher.is_ui_thread());
    }

    #[test]
    fn invoke_runs_inline_on_ui_thread() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        let inner = dispatcher.clone();
        // A nested invoke would deadlock if it were queued behind its caller.
        let value = dispatcher
            .invoke(move || inner.invoke(|| 7).expect("nested invoke"))
            .expect("invoke");
        assert_eq!(value, 7);
    }

    #[test]
    fn post_returns_before_task_runs() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel();

        dispatcher
            .post(move || {
                let _ = release_rx.recv();
                let _ = done_tx.send(());
            })
            .expect("post");

        assert!(done_rx.try_recv().is_err());
        release_tx.send(()).expect("release");
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("task should run");
    }

    #[test]
    fn shutdown_fails_fast() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        ui.shutdown();

        assert!(dispatcher.is_shut_down());
        assert_eq!(dispatcher.invoke(|| ()), Err(DispatchError::NoUiThread));
        assert_eq!(dispatcher.post(|| ()), Err(DispatchError::NoUiThread));
    }

    #[test]
    fn queued_work_runs_before_shutdown() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            dispatcher
                .post(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .expect("post");
        }
        ui.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn accepted_posts_run_when_shutdown_races() {
        for _ in 0..50 {
            let ui = UiThread::spawn(&config()).expect("spawn");
            let accepted = Arc::new(AtomicUsize::new(0));
            let executed = Arc::new(AtomicUsize::new(0));

            let posters: Vec<_> = (0..4)
                .map(|_| {
                    let dispatcher = ui.dispatcher();
                    let accepted = Arc::clone(&accepted);
                    let executed = Arc::clone(&executed);
                    thread::spawn(move || loop {
                        let executed = Arc::clone(&executed);
                        let posted = dispatcher.post(move || {
                            executed.fetch_add(1, Ordering::SeqCst);
                        });
                        match posted {
                            Ok(()) => accepted.fetch_add(1, Ordering::SeqCst),
                            Err(err) => {
                                assert_eq!(err, DispatchError::NoUiThread);
                                break;
                            }
                        };
                    })
                })
                .collect();

            thread::sleep(Duration::from_millis(2));
            ui.shutdown();
            for poster in posters {
                poster.join().expect("poster");
            }
            assert_eq!(accepted.load(Ordering::SeqCst), executed.load(Ordering::SeqCst));
        }
    }

    #[test]
    fn invoke_times_out() {
        let mut config = config();
        config.invoke_timeout_ms = Some(50);
        let ui = UiThread::spawn(&config).expect("spawn");
        let dispatcher = ui.dispatcher();

        let started = Instant::now();
        let result = dispatcher.invoke(|| thread::sleep(Duration::from_millis(300)));
        assert_eq!(result, Err(DispatchError::Timeout(Duration::from_millis(50))));
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn invoke_resumes_panic_on_caller() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        let _ = dispatcher.invoke(|| panic!("boom"));
    }

    #[test]
    fn posted_panic_keeps_loop_alive() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        dispatcher.post(|| panic!("posted failure")).expect("post");
        assert_eq!(dispatcher.invoke(|| 1 + 1), Ok(2));
    }

    #[test]
    fn empty_thread_name_is_invalid() {
        let config = DispatcherConfig {
            thread_name: "  ".to_string(),
            invoke_timeout_ms: None,
        };
        assert!(matches!(
            UiThread::spawn(&config),
            Err(DispatchError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Dispatcher::new(&config),
            Err(DispatchError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn host_loop_runs_pending_tasks() {
        let (dispatcher, event_loop) = Dispatcher::new(&config()).expect("dispatcher");
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            dispatcher
                .post(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .expect("post");
        }

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(event_loop.run_pending(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(event_loop.run_pending(), 0);
    }

    #[test]
    fn dropped_loop_disconnects_dispatcher() {
        let (dispatcher, event_loop) = Dispatcher::new(&config()).expect("dispatcher");
        drop(event_loop);
        assert_eq!(dispatcher.post(|| ()), Err(DispatchError::NoUiThread));
        assert_eq!(dispatcher.invoke(|| ()), Err(DispatchError::NoUiThread));
    }

    #[test]
    fn push_frame_requires_ui_thread() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        let frame = DispatchFrame::new();
        assert_eq!(
            dispatcher.push_frame(&frame),
            Err(DispatchError::WrongThread)
        );
    }

    #[test]
    fn push_frame_processes_work_until_exited() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        let frame = DispatchFrame::new();
        let (entered_tx, entered_rx) = mpsc::channel();

        let modal_dispatcher = dispatcher.clone();
        let modal_frame = frame.clone();
        let modal = thread::spawn(move || {
            let frame_dispatcher = modal_dispatcher.clone();
            modal_dispatcher.invoke(move || {
                let _ = entered_tx.send(());
                frame_dispatcher.push_frame(&modal_frame)
            })
        });

        entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("frame entered");
        // The UI thread is inside the frame but still serves other callers.
        assert_eq!(dispatcher.invoke(|| 5), Ok(5));

        frame.exit();
        let result = modal.join().expect("modal thread");
        assert_eq!(result, Ok(Ok(())));
    }

    #[tokio::test]
    async fn invoke_async_returns_result() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        let name = dispatcher
            .invoke_async(|| thread::current().name().map(str::to_string))
            .await
            .expect("invoke_async");
        assert_eq!(name.as_deref(), Some("test-ui"));
    }

    #[tokio::test]
    async fn invoke_async_after_shutdown_fails() {
        let ui = UiThread::spawn(&config()).expect("spawn");
        let dispatcher = ui.dispatcher();
        ui.shutdown();
        let result = dispatcher.invoke_async(|| ()).await;
        assert_eq!(result, Err(DispatchError::NoUiThread));
    }
}
