pub mod arithmetic;
pub mod comparison;

pub use arithmetic::BinaryOperation;
