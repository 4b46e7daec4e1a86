//! Lockstep Workloads
//!
//! Numeric kernels that put the lockstep executors under realistic load:
//! - **sqrt**: per-element Newton refinement, embarrassingly parallel with
//!   uneven per-task cost (`sqrt` module)
//! - **gemm**: dense matrix multiply-accumulate over disjoint row bands
//!   (`gemm` module)
//! - **pagerank**: iterative graph scoring built from dependent bulk
//!   submissions (`pagerank` module)
//!
//! Every kernel ships a serial reference next to its parallel form so
//! tests can hold the executors to exact or near-exact output parity.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod gemm;
pub mod pagerank;
pub mod sqrt;
