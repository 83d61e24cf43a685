// Start of file: /src/models/mod.rs

/*
    * Data models: the additional-data tree, the exception types handlers
    * raise, the problem payload and the request view the factory reads.
*/

pub mod data;
pub mod exception;
pub mod problem;
pub mod request;

// End of file: /src/models/mod.rs
