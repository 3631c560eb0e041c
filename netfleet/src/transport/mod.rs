//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management:
//! algorithm negotiation policy, host key verification, authentication
//! and PTY channel creation.

pub mod algorithms;
pub mod config;
mod ssh;

pub use algorithms::{AlgorithmPolicy, AlgorithmPreset, DisabledAlgorithms};
pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
