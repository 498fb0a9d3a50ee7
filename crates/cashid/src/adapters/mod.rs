//! Default adapter implementations for the outbound ports.

pub mod memory;
