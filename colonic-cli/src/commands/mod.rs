// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod report;
pub mod setup;
pub mod status;
pub mod teardown;
pub mod validate;
