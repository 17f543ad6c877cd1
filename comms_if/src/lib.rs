//! # Communications interface crate.
//!
//! Provides the wire interface definitions shared between the hand executable and the glove
//! microcontroller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Frame definitions and codecs for equipment (like the glove)
pub mod eqpt;
