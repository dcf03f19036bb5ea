//! # OT-based Beaver triplets
//!
//! Two parties generate additive shares of fixed-point multiplication triplets with 1-out-of-2
//! oblivious transfer (OT): base OTs from [ocelot], a PRG-based OT extension on top of them, and a
//! bit-decomposed secure product.
//!
//! [triplet] is the main module of this library.
//!
//! - [fixed_point]: truncated fixed-point arithmetic shared by both parties.
//! - [ot_ext]: base-OT bootstrap and OT-extension endpoints.
//! - [masks]: correction masks of the OT-extension receiver.
//! - [product]: secure product engine.
//! - [triplet]: buffered triplet and penta-triplet generation.
#![warn(missing_docs)]

pub mod block_utils;
pub mod channel_utils;
pub mod cli_utils;
pub mod errors;
pub mod fixed_point;
pub mod masks;
pub mod ot_ext;
pub mod party;
pub mod product;
pub mod triplet;

#[cfg(test)]
mod test_utils;

pub use errors::{Result, TripletError};
