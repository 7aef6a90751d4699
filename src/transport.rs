//! Wire-transport collaborator seam: a broker-based mailbox transport
//! and a local socket transport are both out of scope for this crate.
//! `RequestTransport` lets SWS/CAMS be unit-tested without either real
//! transport.

use async_trait::async_trait;
use serde_json::Value;

/// `[correlation_id, command, arg0, arg1, …]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub correlation_id: String,
    pub command: String,
    pub args: Vec<Value>,
}

/// The sender identity a request arrived from, used by the access
/// policy evaluator.
pub type Sender = String;

/// Collaborator seam standing in for the real request/reply transport.
#[async_trait]
pub trait RequestTransport: Send + Sync {
    async fn recv(&self) -> Option<(Sender, Frame)>;
    async fn reply(&self, correlation_id: &str, payload: Value);
}

/// An in-process transport backed by channels, good enough to drive
/// SWS/CAMS end-to-end in integration tests without a real mailbox
/// broker or local socket.
pub mod in_process {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::sync::Mutex;

    pub struct InProcessTransport {
        inbound: Mutex<mpsc::UnboundedReceiver<(Sender, Frame)>>,
        outbound: mpsc::UnboundedSender<(String, Value)>,
    }

    pub struct InProcessHandle {
        pub requests: mpsc::UnboundedSender<(Sender, Frame)>,
        pub replies: Mutex<mpsc::UnboundedReceiver<(String, Value)>>,
    }

    pub fn channel() -> (InProcessTransport, InProcessHandle) {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (rep_tx, rep_rx) = mpsc::unbounded_channel();
        (
            InProcessTransport {
                inbound: Mutex::new(req_rx),
                outbound: rep_tx,
            },
            InProcessHandle {
                requests: req_tx,
                replies: Mutex::new(rep_rx),
            },
        )
    }

    #[async_trait]
    impl RequestTransport for InProcessTransport {
        async fn recv(&self) -> Option<(Sender, Frame)> {
            self.inbound.lock().await.recv().await
        }

        async fn reply(&self, correlation_id: &str, payload: Value) {
            let _ = self.outbound.send((correlation_id.to_string(), payload));
        }
    }
}
