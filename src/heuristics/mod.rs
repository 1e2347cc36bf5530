//! Heuristics module for SCP-CS.
//!
//! This module exports the decoder, the evolutionary engine and the
//! improvement heuristics.

pub mod decoder;
pub mod local_search;
pub mod brkga;

pub use decoder::*;
pub use local_search::*;
pub use brkga::*;
