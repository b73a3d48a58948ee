/// Connection lifecycle of a single tablet.
///
/// `Online` carries the identity resolved from the device properties during
/// the connect handshake; it is populated once per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Offline,
    Connecting,
    Online { name: String, os_version: String },
}

impl ConnectionState {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectionState::Online { .. })
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, ConnectionState::Connecting)
    }
}
