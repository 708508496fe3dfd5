//! Integration tests for vmm-bot.
//!
//! These tests drive the trader service end to end against the paper venue:
//! - Scheduling and paired order placement
//! - Gateway failures and timeouts
//! - Shutdown behaviour

pub mod common;
