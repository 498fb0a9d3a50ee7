//! Pure protocol logic: the field catalogue, the URL codec, the entities and
//! the error taxonomy. No I/O happens in this layer.

pub mod codec;
pub mod config;
pub mod entities;
pub mod errors;
pub mod fields;
