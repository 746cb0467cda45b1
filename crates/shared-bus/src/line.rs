//! # Line-Delimited Stream Channel
//!
//! Carries one message per line over any byte stream pair: the process's
//! stdin/stdout, a child process's pipes, or an in-process duplex.
//!
//! Messages must not contain a raw newline. Compact `serde_json` output never
//! does, so JSON envelopes frame cleanly.

use crate::channel::{ChannelError, MessageChannel};
use crate::subscriber::Subscription;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Channel adapter over a reader/writer pair.
pub struct LineChannel {
    /// Outbound half. Locked for the duration of one line so concurrent
    /// sends never interleave.
    writer: tokio::sync::Mutex<BoxedWriter>,

    /// Lines read by the reader task, taken by the first `subscribe()`.
    inbound: Mutex<Option<mpsc::UnboundedReceiver<String>>>,

    reader_task: JoinHandle<()>,

    messages_sent: AtomicU64,

    label: String,
}

impl LineChannel {
    /// Wrap a reader/writer pair. Must be called inside a Tokio runtime: a
    /// task is spawned to read lines.
    pub fn new<R, W>(reader: R, writer: W, label: impl Into<String>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let label = label.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(read_lines(reader, tx, label.clone()));

        Self {
            writer: tokio::sync::Mutex::new(Box::new(writer)),
            inbound: Mutex::new(Some(rx)),
            reader_task,
            messages_sent: AtomicU64::new(0),
            label,
        }
    }

    /// Channel over this process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), "stdio")
    }

    /// Adapter label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for LineChannel {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

async fn read_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>, label: String)
where
    R: AsyncRead + Send + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(line).is_err() {
                    debug!(channel = %label, "Subscriber gone, reader stopping");
                    break;
                }
            }
            Ok(None) => {
                debug!(channel = %label, "Input stream ended");
                break;
            }
            Err(e) => {
                warn!(channel = %label, error = %e, "Input stream failed");
                break;
            }
        }
    }
}

#[async_trait]
impl MessageChannel for LineChannel {
    async fn send(&self, message: String) -> Result<(), ChannelError> {
        if message.contains('\n') {
            return Err(ChannelError::InvalidFrame(
                "message contains a newline".to_string(),
            ));
        }

        let mut writer = self.writer.lock().await;
        writer
            .write_all(message.as_bytes())
            .await
            .map_err(|e| ChannelError::Io(e.to_string()))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| ChannelError::Io(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| ChannelError::Io(e.to_string()))?;

        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn subscribe(&self) -> Result<Subscription, ChannelError> {
        let receiver = self
            .inbound
            .lock()
            .take()
            .ok_or(ChannelError::AlreadySubscribed)?;
        Ok(Subscription::new(receiver, self.label.clone()))
    }

    fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }
}
