//! [`RadioBackend`] adapter over a real serial port, using
//! [`crate::serial_frame`] for the wire envelope. Writing is synchronous
//! from `submit`'s point of view (the bytes are simply put on the wire);
//! the resulting ACK/NAK/CAN or completion is reported back to the
//! gateway separately, by the reader loop in `main.rs` calling
//! [`zwave_gateway::radio::RadioFacade::notify_tx_complete`].

use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use zwave_core::definitions::NodeId;
use zwave_core::gateway_model::TxFlags;
use zwave_gateway::radio::RadioBackend;

use crate::serial_frame::encode_data_frame;

/// `W` is the write half of the serial port (`tokio::io::split` splits a
/// `SerialStream` into a `ReadHalf`, owned by the reader task in
/// `main.rs`, and this `WriteHalf`).
pub struct SerialRadioBackend<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send + 'static> SerialRadioBackend<W> {
    pub fn new(writer: W) -> Arc<Self> {
        Arc::new(Self {
            writer: Mutex::new(writer),
        })
    }
}

impl<W: AsyncWrite + Unpin + Send + 'static> RadioBackend for SerialRadioBackend<W> {
    fn submit(
        &self,
        _snode: NodeId,
        _dnode: NodeId,
        frame: Bytes,
        _tx_flags: TxFlags,
    ) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let encoded = encode_data_frame(&frame);
            let mut writer = self.writer.lock().await;
            if let Err(err) = writer.write_all(&encoded).await {
                tracing_log_write_failure(&err);
            }
        })
    }

    fn abort(&self) -> BoxFuture<'_, ()> {
        // The radio chip has no cooperative abort; the emergency timer in
        // RadioFacade is what actually bounds an unanswered send.
        Box::pin(async move {})
    }
}

fn tracing_log_write_failure(err: &std::io::Error) {
    eprintln!("serial write failed: {err}");
}
