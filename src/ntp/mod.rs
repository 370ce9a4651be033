pub mod client;
pub mod error;
pub mod packet;
pub mod sync;

pub use client::{NtpClient, ProbeOutcome};
pub use error::NtpError;
pub use sync::{NtpSync, SyncNotice};
