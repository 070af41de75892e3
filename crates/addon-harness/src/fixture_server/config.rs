use std::net::Ipv4Addr;
use std::net::SocketAddr;

use addon_harness_common::parse_env_u16;

pub const DEFAULT_MOCK_PORT: u16 = 4010;
pub(crate) const MOCK_PORT_ENV: &str = "MOCK_PORT";

/// Listener settings. The fixture server only ever binds the loopback interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureServerConfig {
    listen: SocketAddr,
}

impl Default for FixtureServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl FixtureServerConfig {
    pub fn from_env() -> Self {
        Self::with_port(parse_env_u16(MOCK_PORT_ENV, DEFAULT_MOCK_PORT))
    }

    /// Port `0` asks the OS for an ephemeral port.
    pub fn with_port(port: u16) -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
        }
    }

    pub fn listen(&self) -> SocketAddr {
        self.listen
    }
}
