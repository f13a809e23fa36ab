use crate::transport::Transport;

/// Transport half that lives inside the session.
///
/// Calls only record intent: the runner task picks up connect and close
/// requests and moves the outbox onto its send queue.
#[derive(Debug, Default)]
pub struct TcpTransport {
    connect_request: Option<(String, u16)>,
    close_request: bool,
    connected: bool,
    outbox: Vec<u8>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn take_connect_request(&mut self) -> Option<(String, u16)> {
        self.connect_request.take()
    }

    pub(crate) fn take_close_request(&mut self) -> bool {
        std::mem::take(&mut self.close_request)
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        if !connected {
            self.outbox.clear();
        }
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16) {
        self.connect_request = Some((host.to_string(), port));
    }

    fn write(&mut self, data: &[u8]) -> usize {
        if !self.connected {
            return 0;
        }
        self.outbox.extend_from_slice(data);
        data.len()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connect_request = None;
        self.close_request = true;
        self.set_connected(false);
    }
}
