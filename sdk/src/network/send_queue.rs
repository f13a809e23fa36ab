/// Unsent bytes above which the session is told the send buffer is full.
pub(crate) const SEND_BUFFER_SIZE: usize = 64 * 1024;

/// Bytes accepted from the session but not yet taken by the socket.
///
/// Crossing `SEND_BUFFER_SIZE` reports full once; the queue reports drained
/// again only when the socket has taken everything.
#[derive(Debug, Default)]
pub(crate) struct SendQueue {
    data: Vec<u8>,
    full: bool,
}

impl SendQueue {
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Queue bytes, returns `Some(true)` when the queue just became full
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Option<bool> {
        self.data.extend_from_slice(bytes);
        if !self.full && self.data.len() > SEND_BUFFER_SIZE {
            self.full = true;
            return Some(true);
        }
        None
    }

    /// Drop bytes the socket accepted, returns `Some(false)` when a full
    /// queue just drained
    pub(crate) fn consume(&mut self, written: usize) -> Option<bool> {
        self.data.drain(..written.min(self.data.len()));
        if self.full && self.data.is_empty() {
            self.full = false;
            return Some(false);
        }
        None
    }

    /// Forget everything, used when the connection goes away
    pub(crate) fn clear(&mut self) {
        self.data.clear();
        self.full = false;
    }
}
