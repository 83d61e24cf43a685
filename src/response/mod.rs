// Start of file: /src/response/mod.rs

pub mod factory;
pub mod prototype;

// End of file: /src/response/mod.rs
