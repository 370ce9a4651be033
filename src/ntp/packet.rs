//! SNTP v3 client packets.
//!
//! The request is 48 bytes with only the first byte set: LI=0, VN=3,
//! Mode=3 (client). Of the reply only the integer part of the transmit
//! timestamp (bytes 40..44, big-endian seconds since 1900-01-01) is read.

use super::NtpError;

pub const PACKET_LEN: usize = 48;

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
pub const NTP_UNIX_DELTA: u32 = 2_208_988_800;

const CLIENT_HEADER: u8 = 0x1B;
const TRANSMIT_SECONDS: std::ops::Range<usize> = 40..44;

pub fn request_packet() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Unix seconds carried in a server reply's transmit timestamp.
///
/// The subtraction wraps in 32 bits, so replies from NTP era 1 (after
/// 2036-02-07) keep decoding correctly up to 2106.
pub fn transmit_unix_seconds(reply: &[u8]) -> Result<i64, NtpError> {
    if reply.len() < PACKET_LEN {
        return Err(NtpError::Malformed(format!(
            "expected {PACKET_LEN} bytes, got {}",
            reply.len()
        )));
    }

    let mut seconds = [0u8; 4];
    seconds.copy_from_slice(&reply[TRANSMIT_SECONDS]);
    let ntp_seconds = u32::from_be_bytes(seconds);
    if ntp_seconds == 0 {
        return Err(NtpError::Malformed("transmit timestamp is zero".into()));
    }

    Ok(i64::from(ntp_seconds.wrapping_sub(NTP_UNIX_DELTA)))
}

#[cfg(test)]
pub(crate) fn reply_with_transmit(unix_seconds: i64) -> [u8; PACKET_LEN] {
    let mut reply = [0u8; PACKET_LEN];
    reply[0] = 0x1C; // LI=0, VN=3, Mode=4 (server)
    let ntp_seconds = (unix_seconds as u32).wrapping_add(NTP_UNIX_DELTA);
    reply[TRANSMIT_SECONDS].copy_from_slice(&ntp_seconds.to_be_bytes());
    reply
}
