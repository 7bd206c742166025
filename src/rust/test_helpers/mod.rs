// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

pub mod engine;
pub mod runtime;

pub use self::{engine::TestEngine, runtime::SharedTestRuntime};

use crate::runtime::network::config::CtcpConfig;

//==============================================================================
// Constants
//==============================================================================

/// Default application sink capacity: effectively unbounded for tests that
/// do not exercise back-pressure.
pub const SINK_CAPACITY: usize = 1024 * 1024;

//==============================================================================
// Standalone Functions
//==============================================================================

pub fn new_alice() -> TestEngine {
    TestEngine::new(CtcpConfig::default(), SINK_CAPACITY)
}

pub fn new_bob() -> TestEngine {
    TestEngine::new(CtcpConfig::default(), SINK_CAPACITY)
}
