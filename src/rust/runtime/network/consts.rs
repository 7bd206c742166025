// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use ::std::time::Duration;

//======================================================================================================================
// Constants
//======================================================================================================================

/// Maximum payload bytes per segment. Compile-time upper bound: the wire
/// codec rejects anything larger regardless of configuration.
pub const MAX_SEGMENT_DATA_SIZE: usize = 1440;

/// Minimum MSS a configuration may select.
pub const MIN_MSS: usize = 536;

/// Default MSS.
pub const DEFAULT_MSS: usize = MAX_SEGMENT_DATA_SIZE;

/// Default send and receive buffer size: eight full segments.
pub const DEFAULT_WINDOW_SIZE: usize = 8 * MAX_SEGMENT_DATA_SIZE;

/// Default retransmission timeout.
pub const DEFAULT_RT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default retransmission cap. A segment retransmitted more than this many
/// times kills its connection.
pub const DEFAULT_MAX_RETRANSMITS: usize = 5;
