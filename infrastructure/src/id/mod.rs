pub mod random_numeric;

pub use random_numeric::RandomNumericIdGenerator;
