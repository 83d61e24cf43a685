// Start of file: /src/core/mod.rs

/*
    * Demo server plumbing: router assembly, listener, shutdown and logging.
*/

pub mod logging;
pub mod server;

// End of file: /src/core/mod.rs
