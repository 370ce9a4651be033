use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{lookup_host, UdpSocket};

use crate::settings::TimeConfig;

use super::{
    packet::{request_packet, transmit_unix_seconds, PACKET_LEN},
    NtpError,
};

pub const REPLY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Result of the connectivity check run before network settings are saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The request left the host; the server was not waited on.
    Sent,
    InvalidConfig,
    Unresolvable,
    SocketError,
}

impl ProbeOutcome {
    pub fn is_usable(&self) -> bool {
        matches!(self, ProbeOutcome::Sent)
    }
}

/// Address, port and interval checks shared by the probe and the sync loop.
pub fn validate(config: &TimeConfig) -> Result<u16, NtpError> {
    if config.address.trim().is_empty() {
        return Err(NtpError::InvalidConfig("address is empty".into()));
    }
    if config.sync_interval_ms == 0 {
        return Err(NtpError::InvalidConfig("sync interval must be positive".into()));
    }
    match u16::try_from(config.port) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(NtpError::InvalidConfig(format!(
            "port {} is outside 1..=65535",
            config.port
        ))),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NtpClient {
    reply_timeout: Duration,
}

impl Default for NtpClient {
    fn default() -> Self {
        Self {
            reply_timeout: REPLY_TIMEOUT,
        }
    }
}

impl NtpClient {
    pub fn with_timeout(reply_timeout: Duration) -> Self {
        Self { reply_timeout }
    }

    /// One request/reply exchange; returns the server's Unix seconds.
    pub async fn query(&self, config: &TimeConfig) -> Result<i64, NtpError> {
        let socket = connect(config).await?;
        socket.send(&request_packet()).await?;

        // Room for oversized replies so they are not silently truncated to 48.
        let mut reply = [0u8; PACKET_LEN * 2];
        let received = tokio::time::timeout(self.reply_timeout, socket.recv(&mut reply))
            .await
            .map_err(|_| NtpError::Timeout(self.reply_timeout))??;

        transmit_unix_seconds(&reply[..received])
    }

    /// Resolve and send without waiting for a reply.
    pub async fn probe(&self, config: &TimeConfig) -> ProbeOutcome {
        let socket = match connect(config).await {
            Ok(socket) => socket,
            Err(NtpError::InvalidConfig(_)) => return ProbeOutcome::InvalidConfig,
            Err(NtpError::Resolve { .. }) | Err(NtpError::NoAddress(_)) => {
                return ProbeOutcome::Unresolvable
            }
            Err(_) => return ProbeOutcome::SocketError,
        };

        match socket.send(&request_packet()).await {
            Ok(sent) if sent == PACKET_LEN => ProbeOutcome::Sent,
            Ok(_) | Err(_) => ProbeOutcome::SocketError,
        }
    }
}

async fn resolve(config: &TimeConfig, port: u16) -> Result<SocketAddr, NtpError> {
    let address = config.address.trim();
    let mut candidates = lookup_host((address, port))
        .await
        .map_err(|source| NtpError::Resolve {
            address: address.to_string(),
            source,
        })?;
    candidates
        .next()
        .ok_or_else(|| NtpError::NoAddress(address.to_string()))
}

async fn connect(config: &TimeConfig) -> Result<UdpSocket, NtpError> {
    let port = validate(config)?;
    let target = resolve(config, port).await?;

    let local: SocketAddr = if target.is_ipv4() {
        ([0u8; 4], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(target).await?;
    Ok(socket)
}
