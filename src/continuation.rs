//! Yield channel that lets a running operation body publish intermediate
//! results before it finally returns.
//!
//! Each yield is acknowledged: the sender blocks until the receiving
//! [`crate::store::Store`] has applied the update to state and notified
//! subscribers, so an operation that yields twice in a row is guaranteed
//! the first yield was observable before the second one lands.

use tokio::sync::{mpsc, oneshot};

pub(crate) enum Yield<V, E> {
    Value(V),
    Error(E),
}

pub(crate) struct Envelope<V, E> {
    pub yielded: Yield<V, E>,
    pub ack: oneshot::Sender<()>,
}

pub struct Continuation<V, E> {
    sender: mpsc::UnboundedSender<Envelope<V, E>>,
}

impl<V, E> Continuation<V, E> {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Envelope<V, E>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    async fn send(&self, yielded: Yield<V, E>) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .sender
            .send(Envelope {
                yielded,
                ack: ack_tx,
            })
            .is_ok()
        {
            // If the receiving loop has already exited (store torn down
            // mid-run) the ack channel drops and `await` resolves with an
            // error we can safely ignore: there's no state left to update.
            let _ = ack_rx.await;
        }
    }

    pub async fn yield_value(&self, value: V) {
        self.send(Yield::Value(value)).await;
    }

    pub async fn yield_error(&self, error: E) {
        self.send(Yield::Error(error)).await;
    }

    pub async fn yield_result(&self, result: Result<V, E>) {
        match result {
            Ok(value) => self.yield_value(value).await,
            Err(error) => self.yield_error(error).await,
        }
    }
}
