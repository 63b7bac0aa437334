pub mod signature;
pub mod token;
