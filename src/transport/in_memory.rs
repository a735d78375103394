use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::transport::{Transport, TransportError};

/// Connected pair of transports that hand values over without framing.
pub struct InMemoryTransport {
    outgoing: UnboundedSender<Value>,
    incoming: UnboundedReceiver<Value>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = unbounded_channel();
        let (tx2, rx2) = unbounded_channel();
        (
            Self {
                outgoing: tx1,
                incoming: rx2,
            },
            Self {
                outgoing: tx2,
                incoming: rx1,
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, value: &Value) -> Result<(), TransportError> {
        self.outgoing
            .send(value.clone())
            .map_err(|_| TransportError::Disconnected)
    }

    async fn recv(&mut self) -> Result<Value, TransportError> {
        self.incoming.recv().await.ok_or(TransportError::Disconnected)
    }
}
