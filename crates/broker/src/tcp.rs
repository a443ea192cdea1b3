//! TcpBroker - broker client over a length-prefixed TCP session
//!
//! A writer task owns the write half and drains a submission queue, so
//! `publish` never blocks the caller. A reader task owns the read half and
//! resolves ack waiters by sequence number.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{BrokerPublisher, ContractError};

use crate::error::{BrokerError, Result};
use crate::wire::{self, Frame};

type AckWaiter = oneshot::Sender<std::result::Result<(), ContractError>>;
type PendingMap = Arc<Mutex<HashMap<u64, (String, AckWaiter)>>>;

/// Broker client over TCP
pub struct TcpBroker {
    seq: AtomicU64,
    writer_tx: mpsc::UnboundedSender<Frame>,
    pending: PendingMap,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
}

impl TcpBroker {
    /// Connect to a broker server
    ///
    /// # Errors
    /// Connection errors; no background task is started on failure.
    #[instrument(name = "tcp_broker_connect", skip(host), fields(host = %host))]
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| BrokerError::Connection(format!("{host}:{port}: {e}")))?;
        let _ = stream.set_nodelay(true);

        let (mut read_half, mut write_half) = stream.into_split();
        let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<Frame>();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let writer_task = tokio::spawn(async move {
            while let Some(frame) = writer_rx.recv().await {
                let buf = match wire::encode(&frame) {
                    Ok(buf) => buf,
                    Err(e) => {
                        error!(error = %e, "failed to encode publish frame");
                        continue;
                    }
                };
                if let Err(e) = write_half.write_all(&buf).await {
                    error!(error = %e, "broker write failed");
                    break;
                }
            }
            debug!("broker writer stopped");
        });

        let reader_pending = Arc::clone(&pending);
        let reader_task = tokio::spawn(async move {
            loop {
                match wire::read_frame(&mut read_half).await {
                    Ok(Some(Frame::Ack { seq, error })) => {
                        let waiter = lock(&reader_pending).remove(&seq);
                        match waiter {
                            Some((subject, tx)) => {
                                let result = match error {
                                    None => Ok(()),
                                    Some(msg) => {
                                        Err(ContractError::broker_publish(subject, msg))
                                    }
                                };
                                let _ = tx.send(result);
                            }
                            None => warn!(seq, "ack for unknown publish"),
                        }
                    }
                    Ok(Some(frame)) => warn!(?frame, "unexpected frame from broker"),
                    Ok(None) => {
                        debug!("broker closed connection");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "broker read failed");
                        break;
                    }
                }
            }
            fail_pending(&reader_pending);
        });

        debug!("broker session established");

        Ok(Self {
            seq: AtomicU64::new(1),
            writer_tx,
            pending,
            writer_task,
            reader_task,
        })
    }

    /// Count of publishes awaiting broker confirmation
    pub fn inflight(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Close the session
    ///
    /// Outstanding ack waiters resolve with a connection-closed error.
    #[instrument(name = "tcp_broker_close", skip(self))]
    pub async fn close(self) {
        drop(self.writer_tx);
        if let Err(e) = self.writer_task.await {
            error!(error = ?e, "writer task panicked");
        }
        self.reader_task.abort();
        let _ = self.reader_task.await;
        fail_pending(&self.pending);
        debug!("broker session closed");
    }
}

impl BrokerPublisher for TcpBroker {
    type Ack = Pin<Box<dyn Future<Output = std::result::Result<(), ContractError>> + Send>>;

    fn publish(&self, subject: &str, payload: Bytes) -> std::result::Result<Self::Ack, ContractError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(seq, (subject.to_string(), tx));

        let frame = Frame::Publish {
            seq,
            subject: subject.to_string(),
            payload: payload.to_vec(),
        };
        if self.writer_tx.send(frame).is_err() {
            lock(&self.pending).remove(&seq);
            return Err(ContractError::broker_publish(subject, "no broker session"));
        }

        let subject = subject.to_string();
        Ok(Box::pin(async move {
            rx.await.unwrap_or_else(|_| {
                Err(ContractError::broker_publish(subject, "connection closed"))
            })
        }))
    }
}

fn fail_pending(pending: &PendingMap) {
    let drained: Vec<(u64, (String, AckWaiter))> = lock(pending).drain().collect();
    for (_, (subject, tx)) in drained {
        let _ = tx.send(Err(ContractError::broker_publish(
            subject,
            "connection closed",
        )));
    }
}

// Mutation under the lock is a single insert/remove, so a poisoned guard
// still holds a consistent map.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Test server that acks publishes after buffering `batch` of them,
    /// in reverse arrival order.
    async fn spawn_test_server(batch: usize, error: Option<String>) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut read_half, mut write_half) = stream.into_split();
            let mut held = Vec::new();

            while let Ok(Some(frame)) = wire::read_frame(&mut read_half).await {
                if let Frame::Publish { seq, .. } = frame {
                    held.push(seq);
                    if held.len() >= batch {
                        for seq in held.drain(..).rev() {
                            let ack = Frame::Ack {
                                seq,
                                error: error.clone(),
                            };
                            let buf = wire::encode(&ack).unwrap();
                            write_half.write_all(&buf).await.unwrap();
                        }
                    }
                }
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_publish_resolves_on_ack() {
        let addr = spawn_test_server(1, None).await;
        let broker = TcpBroker::connect(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();

        let ack = broker
            .publish("ACME.DP.orders.0.EVENT.created", Bytes::from_static(b"{}"))
            .unwrap();
        assert!(ack.await.is_ok());
        assert_eq!(broker.inflight(), 0);
        broker.close().await;
    }

    #[tokio::test]
    async fn test_out_of_order_acks_resolve_correct_waiters() {
        let addr = spawn_test_server(2, None).await;
        let broker = TcpBroker::connect(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();

        let ack_a = broker.publish("s.a", Bytes::from_static(b"a")).unwrap();
        let ack_b = broker.publish("s.b", Bytes::from_static(b"b")).unwrap();

        // Server acks b first, then a; both must still resolve
        let (ra, rb) = tokio::join!(ack_a, ack_b);
        assert!(ra.is_ok());
        assert!(rb.is_ok());
        broker.close().await;
    }

    #[tokio::test]
    async fn test_broker_error_ack_propagates() {
        let addr = spawn_test_server(1, Some("stream full".to_string())).await;
        let broker = TcpBroker::connect(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();

        let ack = broker.publish("s.a", Bytes::from_static(b"a")).unwrap();
        let err = ack.await.unwrap_err();
        assert!(err.to_string().contains("stream full"));
        broker.close().await;
    }

    #[tokio::test]
    async fn test_connect_failure() {
        // Port 1 is essentially never listening
        let result = TcpBroker::connect("127.0.0.1", 1).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_close_fails_outstanding_waiters() {
        // Server holds acks until 100 publishes arrive, i.e. never acks here
        let addr = spawn_test_server(100, None).await;
        let broker = TcpBroker::connect(&addr.ip().to_string(), addr.port())
            .await
            .unwrap();

        let ack = broker.publish("s.a", Bytes::from_static(b"a")).unwrap();
        broker.close().await;

        let err = ack.await.unwrap_err();
        assert!(err.to_string().contains("connection closed"));
    }
}
