// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod ctrlblk;
mod receiver;
mod sender;

pub use self::{
    ctrlblk::{ControlBlock, Disposition, State},
    receiver::Receiver,
    sender::Sender,
};
