//! Concierge - Customer Support Chat Relay
//!
//! This crate relays end-user chat messages to a hosted assistant backend
//! with document search, keeping one conversation thread per user.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
