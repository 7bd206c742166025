// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::flexi_logger::Logger;
use ::std::sync::Once;

//==============================================================================
// Static Variables
//==============================================================================

/// Installs the backend at most once, however many hosts call in.
static INIT_LOG: Once = Once::new();

//==============================================================================
// Standalone Functions
//==============================================================================

/// Installs the logging backend behind the `log` facade.
///
/// Verbosity comes from the environment (`RUST_LOG`); without it only
/// warnings and errors are emitted, so per-segment tracing stays off unless
/// explicitly requested. Diagnostics always go to stderr: a host that
/// relays the received byte stream to stdout must never find log lines
/// mixed into it.
pub fn initialize() {
    INIT_LOG.call_once(|| {
        Logger::try_with_env_or_str("warn")
            .expect("malformed RUST_LOG specification")
            .log_to_stderr()
            .start()
            .expect("logging backend failed to start");
    });
}
