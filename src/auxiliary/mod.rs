//! Helper items shared by the stages of the detection pipeline.

pub mod geometry;
pub mod interpolation;
pub mod quadrature;
