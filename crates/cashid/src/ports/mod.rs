//! Trait seams of the engine: the inbound API it offers and the outbound
//! capabilities it consumes.

pub mod inbound;
pub mod outbound;
