//! Engine integration tests
//!
//! End-to-end behavior of the local engine through the public `affine` API.


mod contract;
mod crud;
mod persistence;
mod properties;
mod scenario;
mod similarity;
