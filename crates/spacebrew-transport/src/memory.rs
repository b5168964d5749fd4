//! In-memory transport
//!
//! A connected pair of endpoints backed by tokio channels. Frames sent on
//! one side arrive as [`TransportEvent::Data`] on the other. Closing either
//! side delivers `Disconnected` to both, the same sequence a WebSocket
//! produces when the peer echoes the close frame.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender};

/// Sending half of an in-memory endpoint
#[derive(Clone)]
pub struct ChannelSender {
    peer: mpsc::UnboundedSender<TransportEvent>,
    own: mpsc::UnboundedSender<TransportEvent>,
    connected: Arc<Mutex<bool>>,
}

/// Receiving half of an in-memory endpoint
pub struct ChannelReceiver {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Create two connected endpoints
///
/// Each receiver starts with a `Connected` event queued.
pub fn pair() -> ((ChannelSender, ChannelReceiver), (ChannelSender, ChannelReceiver)) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    let connected = Arc::new(Mutex::new(true));

    let _ = a_tx.send(TransportEvent::Connected);
    let _ = b_tx.send(TransportEvent::Connected);

    let a = ChannelSender {
        peer: b_tx.clone(),
        own: a_tx.clone(),
        connected: connected.clone(),
    };
    let b = ChannelSender {
        peer: a_tx,
        own: b_tx,
        connected,
    };

    ((a, ChannelReceiver { rx: a_rx }), (b, ChannelReceiver { rx: b_rx }))
}

impl ChannelSender {
    /// Inject an event into this endpoint's own receiver
    pub fn inject(&self, event: TransportEvent) -> Result<()> {
        self.own
            .send(event)
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

#[async_trait]
impl TransportSender for ChannelSender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        self.peer
            .send(TransportEvent::Data(data))
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        let was_connected = std::mem::replace(&mut *self.connected.lock(), false);
        if was_connected {
            debug!("Closing in-memory transport");
            let _ = self.peer.send(TransportEvent::Disconnected { reason: None });
            let _ = self.own.send(TransportEvent::Disconnected { reason: None });
        }
        Ok(())
    }
}

#[async_trait]
impl TransportReceiver for ChannelReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}
