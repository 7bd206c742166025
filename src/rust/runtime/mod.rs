// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Exports
//==============================================================================

pub mod fail;
pub mod logging;
pub mod network;
pub mod timer;

pub use self::{fail::Fail, timer::Clock};
