// Start of file: /src/utils/mod.rs

/*
    * Content negotiation, the JSON and XML encoders and the global
    * error handler for tower layers.
*/

pub mod error_handling;
pub mod json;
pub mod negotiation;
pub mod xml;

// End of file: /src/utils/mod.rs
