//! Numerical building blocks shared by the pairs pipeline: descriptive
//! statistics, least squares, unit-root testing and two-sample tests.

pub mod adf;
pub mod descriptive;
pub mod hypothesis;
pub mod mackinnon;
pub mod ols;
