// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Status Codes
//!
//! Every fallible operation of the IPC core reports one of the kinds below.
//!
//! # Delivery
//!
//! - **Synchronous**: bad handles and malformed arguments are returned
//!   directly by the submission call and never produce a hub event
//! - **Asynchronous**: closure and buffer-size failures are only known after
//!   matching and arrive as the status of a completed operation

use core::fmt;

/// ============================================================================
/// Error Kinds
/// ============================================================================

/// Status of a failed kernel operation
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelError {
    /// Handle is absent or was already detached
    NoDescriptor = 1,

    /// Handle exists but names the wrong kind of object
    BadDescriptor = 2,

    /// Malformed submission (flags, alignment, lengths)
    IllegalArgs = 3,

    /// The caller's own side of the channel was closed
    ClosedLocally = 4,

    /// The peer side of the channel was closed
    ClosedRemotely = 5,

    /// Receive buffer cannot hold the matched payload
    BufferTooSmall = 6,

    /// Directory lookup did not find a path component
    NoSuchPath = 7,
}

impl HelError {
    /// Get the raw status code
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Create from a raw status code
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::NoDescriptor),
            2 => Some(Self::BadDescriptor),
            3 => Some(Self::IllegalArgs),
            4 => Some(Self::ClosedLocally),
            5 => Some(Self::ClosedRemotely),
            6 => Some(Self::BufferTooSmall),
            7 => Some(Self::NoSuchPath),
            _ => None,
        }
    }

    /// Get name as string
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoDescriptor => "no descriptor",
            Self::BadDescriptor => "bad descriptor",
            Self::IllegalArgs => "illegal arguments",
            Self::ClosedLocally => "closed locally",
            Self::ClosedRemotely => "closed remotely",
            Self::BufferTooSmall => "buffer too small",
            Self::NoSuchPath => "no such path",
        }
    }
}

impl fmt::Display for HelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result type using HelError
pub type HelResult<T> = Result<T, HelError>;

// ============================================================================
// Tests
// ============================================================================
