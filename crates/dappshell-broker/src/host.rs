//! Stdio host.
//!
//! Drives a [`Broker`] from NDJSON on an input stream and writes replies and
//! queue notifications as NDJSON to an output stream. Input lines are either
//! frame messages or user decisions on queued calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use dappshell_core::Reply;

use crate::broker::{Broker, Dispatch};
use crate::frame::Frame;
use crate::permission::QueuedRequest;

/// Host errors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output writer stopped unexpectedly")]
    WriterGone,
}

/// One input line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    /// A message posted by the frame `frame`.
    Message { frame: String, data: Value },
    Approve {
        #[serde(rename = "queueId")]
        queue_id: u64,
        /// Approve the call's whole section.
        #[serde(default)]
        all: bool,
    },
    Reject {
        #[serde(rename = "queueId")]
        queue_id: u64,
    },
    /// List pending calls, one per (token, section).
    Pending,
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Reply { frame: String, data: Reply },
    Queued(PendingView),
    Pending { requests: Vec<PendingView> },
}

/// A queued call as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingView {
    pub queue_id: u64,
    pub app_id: String,
    pub method: String,
    pub section: Option<String>,
    pub request: Value,
}

impl PendingView {
    fn new(request: &QueuedRequest, broker: &Broker) -> Self {
        Self {
            queue_id: request.queue_id,
            app_id: request.app_id.clone(),
            method: request.method().to_string(),
            section: broker
                .classifier()
                .section_of(request.method())
                .map(|s| s.name.clone()),
            request: request.envelope.to_wire(),
        }
    }
}

/// Frame that tags replies with the id of the frame that sent the message.
struct HostFrame {
    frame_id: String,
    events: mpsc::UnboundedSender<HostEvent>,
}

impl Frame for HostFrame {
    fn post(&self, reply: Reply) {
        let event = HostEvent::Reply {
            frame: self.frame_id.clone(),
            data: reply,
        };
        if self.events.send(event).is_err() {
            debug!(frame = %self.frame_id, "Output closed, dropping reply");
        }
    }
}

/// Run until `input` reaches EOF and every outstanding reply is written.
///
/// Returns the output stream once everything has been flushed.
pub async fn run<R, W>(broker: Broker, input: R, output: W) -> Result<W, HostError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(events_rx, output));

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HostCommand>(&line) {
            Ok(command) => handle_command(&broker, command, &events_tx).await,
            Err(e) => warn!(error = %e, "Skipping malformed input line"),
        }
    }
    info!("Input closed, waiting for outstanding replies");

    // Queued calls hold frames; dropping the broker releases them.
    drop(broker);
    drop(events_tx);

    writer.await.map_err(|_| HostError::WriterGone)?
}

async fn handle_command(
    broker: &Broker,
    command: HostCommand,
    events: &mpsc::UnboundedSender<HostEvent>,
) {
    match command {
        HostCommand::Message { frame, data } => {
            let host_frame = Arc::new(HostFrame {
                frame_id: frame,
                events: events.clone(),
            });
            if let Dispatch::Queued { queue_id } = broker.on_message(&data, host_frame).await
                && let Some(request) = broker.queue().find(queue_id).await
            {
                let _ = events.send(HostEvent::Queued(PendingView::new(&request, broker)));
            }
        }
        HostCommand::Approve { queue_id, all } => {
            if all {
                broker.approve_all(queue_id).await;
            } else {
                broker.approve_single(queue_id).await;
            }
        }
        HostCommand::Reject { queue_id } => {
            broker.reject(queue_id).await;
        }
        HostCommand::Pending => {
            let requests = broker
                .queue()
                .squashed_view(broker.classifier())
                .await
                .iter()
                .map(|r| PendingView::new(r, broker))
                .collect();
            let _ = events.send(HostEvent::Pending { requests });
        }
    }
}

async fn write_events<W>(
    mut events: mpsc::UnboundedReceiver<HostEvent>,
    mut output: W,
) -> Result<W, HostError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        output.flush().await?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn parses_commands() {
        let cmd: HostCommand =
            serde_json::from_str(r#"{"type":"approve","queueId":3,"all":true}"#).unwrap();
        assert_eq!(cmd, HostCommand::Approve { queue_id: 3, all: true });

        let cmd: HostCommand = serde_json::from_str(r#"{"type":"approve","queueId":4}"#).unwrap();
        assert_eq!(cmd, HostCommand::Approve { queue_id: 4, all: false });

        let cmd: HostCommand = serde_json::from_str(r#"{"type":"reject","queueId":5}"#).unwrap();
        assert_eq!(cmd, HostCommand::Reject { queue_id: 5 });

        let cmd: HostCommand = serde_json::from_str(r#"{"type":"pending"}"#).unwrap();
        assert_eq!(cmd, HostCommand::Pending);

        let cmd: HostCommand = serde_json::from_str(
            r#"{"type":"message","frame":"f1","data":{"method":"eth_blockNumber"}}"#,
        )
        .unwrap();
        assert!(matches!(cmd, HostCommand::Message { ref frame, .. } if frame == "f1"));
    }

    #[test]
    fn queued_event_is_flat() {
        let event = HostEvent::Queued(PendingView {
            queue_id: 1,
            app_id: "dapp1".into(),
            method: "eth_accounts".into(),
            section: Some("accounts".into()),
            request: json!({"id": 1}),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "queued");
        assert_eq!(value["queueId"], 1);
        assert_eq!(value["appId"], "dapp1");
        assert_eq!(value["section"], "accounts");
    }
}
