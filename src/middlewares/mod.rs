// Start of file: /src/middlewares/mod.rs

/*
    * Middleware module entry file:
    * - problem_details: the error handling layer
    * - warning_trap: promotes error events while a request is handled
    * - listener: observers notified of rendered errors
*/

pub mod listener;
pub mod problem_details;
pub mod warning_trap;

// End of file: /src/middlewares/mod.rs
