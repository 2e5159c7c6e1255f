//! Online linear regression used by the readouts of the shipped learners

#[macro_use]
extern crate log;

mod recursive_least_squares;

pub use recursive_least_squares::RecursiveLeastSquares;
