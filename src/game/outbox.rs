//! Outbound message fan-out to connected clients

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

/// Per-connection outbound queues, in connection order.
///
/// Sends never wait: a full queue drops the message for that recipient only.
#[derive(Debug, Default)]
pub struct Outbox {
    sinks: Vec<(Uuid, mpsc::Sender<ServerMsg>)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conn_id: Uuid, sink: mpsc::Sender<ServerMsg>) {
        self.unregister(&conn_id);
        self.sinks.push((conn_id, sink));
    }

    pub fn unregister(&mut self, conn_id: &Uuid) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(id, _)| id != conn_id);
        self.sinks.len() != before
    }

    pub fn connection_ids(&self) -> Vec<Uuid> {
        self.sinks.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Send to one connection
    pub fn send_to(&self, conn_id: &Uuid, msg: ServerMsg) {
        if let Some((id, sink)) = self.sinks.iter().find(|(id, _)| id == conn_id) {
            Self::deliver(id, sink, msg);
        }
    }

    /// Send to every connection
    pub fn broadcast(&self, msg: &ServerMsg) {
        for (id, sink) in &self.sinks {
            Self::deliver(id, sink, msg.clone());
        }
    }

    fn deliver(conn_id: &Uuid, sink: &mpsc::Sender<ServerMsg>, msg: ServerMsg) {
        match sink.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(conn_id = %conn_id, "Outbox full, dropping message");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(conn_id = %conn_id, "Outbox closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pong(t: u64) -> ServerMsg {
        ServerMsg::Pong {
            t: t as f64,
            server_time: 0,
        }
    }

    #[test]
    fn broadcast_reaches_every_connection() {
        let mut outbox = Outbox::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        outbox.register(Uuid::new_v4(), tx_a);
        outbox.register(Uuid::new_v4(), tx_b);

        outbox.broadcast(&pong(1));
        assert_eq!(rx_a.try_recv().unwrap(), pong(1));
        assert_eq!(rx_b.try_recv().unwrap(), pong(1));
    }

    #[test]
    fn unicast_reaches_only_target() {
        let mut outbox = Outbox::new();
        let a = Uuid::new_v4();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        outbox.register(a, tx_a);
        outbox.register(Uuid::new_v4(), tx_b);

        outbox.send_to(&a, pong(2));
        assert_eq!(rx_a.try_recv().unwrap(), pong(2));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn slow_recipient_does_not_block_others() {
        let mut outbox = Outbox::new();
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        outbox.register(Uuid::new_v4(), slow_tx);
        outbox.register(Uuid::new_v4(), fast_tx);

        for t in 0..3 {
            outbox.broadcast(&pong(t));
        }

        assert_eq!(slow_rx.try_recv().unwrap(), pong(0));
        assert!(slow_rx.try_recv().is_err());
        for t in 0..3 {
            assert_eq!(fast_rx.try_recv().unwrap(), pong(t));
        }
    }

    #[test]
    fn unregister_and_closed_sinks() {
        let mut outbox = Outbox::new();
        let a = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(1);
        outbox.register(a, tx);
        drop(rx);

        // Closed receivers are tolerated
        outbox.broadcast(&pong(0));
        assert!(outbox.unregister(&a));
        assert!(!outbox.unregister(&a));
        assert!(outbox.is_empty());
    }
}
