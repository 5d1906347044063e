//! Integration test crate for the coded shutter workspace.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the core, engine and compose crates to verify they work
//! together.

#[cfg(test)]
mod roundtrip;

#[cfg(test)]
mod compositing;

#[cfg(test)]
mod sweep;
