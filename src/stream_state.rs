//! Shared stream connection state

/// Metrics stream connection state
#[derive(Clone, Debug)]
pub enum StreamState {
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

impl StreamState {
    pub fn is_connected(&self) -> bool {
        matches!(self, StreamState::Connected)
    }
}
