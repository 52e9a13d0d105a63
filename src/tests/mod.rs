// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Integration Tests
//!
//! Scenarios that drive several subsystems together through the `hel`
//! call surface, each on its own [`Harness`](crate::testing::Harness).

mod channel_scenarios;
mod irq_scenarios;
mod syscall_tests;
mod universe_scenarios;
