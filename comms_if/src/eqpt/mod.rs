//! # Equipment Interface
//!
//! This module defines the frames which are exchanged with equipment over its link.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod hand;
