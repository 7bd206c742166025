// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::network::consts::{
    DEFAULT_MAX_RETRANSMITS, DEFAULT_MSS, DEFAULT_RT_TIMEOUT, DEFAULT_WINDOW_SIZE,
    MAX_SEGMENT_DATA_SIZE, MIN_MSS,
};
use ::std::time::Duration;

//==============================================================================
// Structures
//==============================================================================

/// cTCP Configuration Descriptor
///
/// Fixed at connection construction; the engine never mutates it.
#[derive(Clone, Debug)]
pub struct CtcpConfig {
    /// Send buffer size, in bytes.
    send_window: usize,
    /// Receive buffer size, in bytes.
    recv_window: usize,
    /// Per-segment retransmission timeout.
    rt_timeout: Duration,
    /// Retransmission cap; exceeding it destroys the connection.
    max_retransmits: usize,
    /// Maximum Segment Size (payload bytes per segment).
    mss: usize,
}

//==============================================================================
// Associate Functions
//==============================================================================

/// Associate Functions for cTCP Configuration Descriptor
impl CtcpConfig {
    /// Creates a cTCP Configuration Descriptor.
    pub fn new(
        send_window: Option<usize>,
        recv_window: Option<usize>,
        rt_timeout: Option<Duration>,
        max_retransmits: Option<usize>,
        mss: Option<usize>,
    ) -> Self {
        let mut options = Self::default();

        if let Some(value) = send_window {
            options = options.set_send_window(value);
        }
        if let Some(value) = recv_window {
            options = options.set_recv_window(value);
        }
        if let Some(value) = rt_timeout {
            options = options.set_rt_timeout(value);
        }
        if let Some(value) = max_retransmits {
            options.max_retransmits = value;
        }
        if let Some(value) = mss {
            options = options.set_mss(value);
        }

        options
    }

    /// Gets the send buffer size in the target [CtcpConfig].
    pub fn get_send_window(&self) -> usize {
        self.send_window
    }

    /// Gets the receive buffer size in the target [CtcpConfig].
    pub fn get_recv_window(&self) -> usize {
        self.recv_window
    }

    /// Gets the retransmission timeout in the target [CtcpConfig].
    pub fn get_rt_timeout(&self) -> Duration {
        self.rt_timeout
    }

    /// Gets the retransmission cap in the target [CtcpConfig].
    pub fn get_max_retransmits(&self) -> usize {
        self.max_retransmits
    }

    /// Gets the maximum segment size in the target [CtcpConfig].
    pub fn get_mss(&self) -> usize {
        self.mss
    }

    /// Sets the send buffer size in the target [CtcpConfig].
    fn set_send_window(mut self, value: usize) -> Self {
        assert!(value > 0);
        self.send_window = value;
        self
    }

    /// Sets the receive buffer size in the target [CtcpConfig].
    fn set_recv_window(mut self, value: usize) -> Self {
        assert!(value > 0);
        self.recv_window = value;
        self
    }

    /// Sets the retransmission timeout in the target [CtcpConfig].
    fn set_rt_timeout(mut self, value: Duration) -> Self {
        assert!(value > Duration::new(0, 0));
        self.rt_timeout = value;
        self
    }

    /// Sets the maximum segment size in the target [CtcpConfig].
    fn set_mss(mut self, value: usize) -> Self {
        assert!(value >= MIN_MSS);
        assert!(value <= MAX_SEGMENT_DATA_SIZE);
        self.mss = value;
        self
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

/// Default Trait Implementation for cTCP Configuration Descriptor
impl Default for CtcpConfig {
    /// Creates a cTCP Configuration Descriptor with the default values.
    fn default() -> Self {
        CtcpConfig {
            send_window: DEFAULT_WINDOW_SIZE,
            recv_window: DEFAULT_WINDOW_SIZE,
            rt_timeout: DEFAULT_RT_TIMEOUT,
            max_retransmits: DEFAULT_MAX_RETRANSMITS,
            mss: DEFAULT_MSS,
        }
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use crate::runtime::network::{
        config::CtcpConfig,
        consts::{DEFAULT_MSS, DEFAULT_WINDOW_SIZE},
    };
    use ::anyhow::Result;
    use ::std::time::Duration;

    /// Tests default instantiation for [CtcpConfig].
    #[test]
    fn test_ctcp_config_default() -> Result<()> {
        let config: CtcpConfig = CtcpConfig::default();
        crate::ensure_eq!(config.get_send_window(), DEFAULT_WINDOW_SIZE);
        crate::ensure_eq!(config.get_recv_window(), DEFAULT_WINDOW_SIZE);
        crate::ensure_eq!(config.get_rt_timeout(), Duration::from_millis(1000));
        crate::ensure_eq!(config.get_max_retransmits(), 5);
        crate::ensure_eq!(config.get_mss(), DEFAULT_MSS);

        Ok(())
    }

    /// Tests custom instantiation for [CtcpConfig].
    #[test]
    fn test_ctcp_config_custom() -> Result<()> {
        let config: CtcpConfig = CtcpConfig::new(
            Some(4096),
            Some(8192),
            Some(Duration::from_millis(250)),
            Some(3),
            Some(1024),
        );
        crate::ensure_eq!(config.get_send_window(), 4096);
        crate::ensure_eq!(config.get_recv_window(), 8192);
        crate::ensure_eq!(config.get_rt_timeout(), Duration::from_millis(250));
        crate::ensure_eq!(config.get_max_retransmits(), 3);
        crate::ensure_eq!(config.get_mss(), 1024);

        Ok(())
    }
}
