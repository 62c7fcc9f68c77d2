//! The service loop.
//!
//! A single task owns the [`App`] and processes messages one at a time, so
//! store writes and session changes never race. Windows talk to it through
//! cloneable [`AppHandle`]s.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::app::App;
use crate::error::Error;
use crate::events::{EventBus, Subscription};
use crate::ipc::{NoteApi, Request, Response};
use crate::window::WindowId;

enum Message {
    Invoke(Request, oneshot::Sender<Response>),
    WindowClosed(WindowId),
    Shutdown(oneshot::Sender<()>),
}

/// Start the service loop on the current tokio runtime.
///
/// The loop runs until [`AppHandle::shutdown`] is called or every handle is
/// dropped, then shuts the app down.
#[must_use]
pub fn spawn(app: App) -> (AppHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(app.config().sync.request_capacity.max(1));
    let handle = AppHandle {
        tx,
        events: app.events().clone(),
    };
    let task = tokio::spawn(run(app, rx));
    (handle, task)
}

async fn run(mut app: App, mut rx: mpsc::Receiver<Message>) {
    info!("Note service listening");
    let mut done = None;

    while let Some(message) = rx.recv().await {
        match message {
            Message::Invoke(request, reply) => {
                let response = app.handle(request);
                if reply.send(response).is_err() {
                    debug!("Requester went away before the response was sent");
                }
            }
            Message::WindowClosed(window) => {
                if let Err(e) = app.window_closed(window) {
                    error!("Failed to handle close of {}: {}", window, e);
                }
            }
            Message::Shutdown(ack) => {
                done = Some(ack);
                break;
            }
        }
    }

    if let Err(e) = app.shutdown() {
        error!("Error during shutdown: {}", e);
    }
    if let Some(ack) = done {
        let _ = ack.send(());
    }
}

/// A cloneable connection to the service loop.
#[derive(Debug, Clone)]
pub struct AppHandle {
    tx: mpsc::Sender<Message>,
    events: EventBus,
}

impl AppHandle {
    /// Receive `note-updated` and window events from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    /// Report that the user closed a window.
    pub async fn window_closed(&self, window: WindowId) {
        if self.tx.send(Message::WindowClosed(window)).await.is_err() {
            debug!("Service stopped, dropping close of {}", window);
        }
    }

    /// Whether the service loop is still accepting requests.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Stop the service loop and wait for it to close its windows.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Message::Shutdown(ack)).await.is_ok() {
            let _ = done.await;
        }
    }
}

#[async_trait::async_trait]
impl NoteApi for AppHandle {
    async fn invoke(&self, request: Request) -> Response {
        let (reply, response) = oneshot::channel();
        if self.tx.send(Message::Invoke(request, reply)).await.is_err() {
            return Response::failure(&Error::ServiceStopped);
        }
        response
            .await
            .unwrap_or_else(|_| Response::failure(&Error::ServiceStopped))
    }
}
