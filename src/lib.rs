//! Darkroom - in-memory photo processing pipeline
//!
//! Rotation, palette quantization with Floyd-Steinberg dithering, face blur
//! and re-encoding, with a result cache that skips work when the options
//! that matter have not changed.
//! This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod services;
pub mod stages;
