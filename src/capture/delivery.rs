//! Single-resolution hand-off from a frame callback to a waiting caller.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use super::RawFrame;
use crate::errors::AcquireError;

type Delivery = Result<RawFrame, AcquireError>;

pub fn channel() -> (FrameSender, FrameReceiver) {
    let (tx, rx) = bounded(1);
    let resolved = Arc::new(AtomicBool::new(false));
    (FrameSender { tx, resolved }, FrameReceiver { rx })
}

/// Producer side, cloneable into platform callbacks.
#[derive(Clone)]
pub struct FrameSender {
    tx: Sender<Delivery>,
    resolved: Arc<AtomicBool>,
}

impl FrameSender {
    /// Resolves the slot. Only the first delivery is kept; returns whether
    /// this call was it.
    pub fn deliver(&self, result: Delivery) -> bool {
        if self.resolved.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.tx.try_send(result).is_ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

/// Consumer side.
pub struct FrameReceiver {
    rx: Receiver<Delivery>,
}

impl FrameReceiver {
    /// Blocks for at most `timeout`.
    pub fn wait(self, timeout: Duration) -> Delivery {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(AcquireError::Timeout {
                ms: timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(AcquireError::Closed),
        }
    }
}
