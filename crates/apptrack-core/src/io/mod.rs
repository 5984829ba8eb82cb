//! IO modules - side effects (network, filesystem)

pub mod hashing;
pub mod retrieve;
