// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod aggregator;
#[cfg(feature = "aws")]
pub mod aws;
pub mod config;
pub mod constants;
pub mod destination;
pub mod errors;
pub mod event;
pub mod local;
pub mod parser;
pub mod processor;
pub mod publisher;
pub mod schema;
pub mod sequencer;
pub mod util;
