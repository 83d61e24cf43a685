// Start of file: /src/config/mod.rs

/*
    * Configuration: problem details settings, environment variables
    * and the demo server state.
*/

pub mod environment;
pub mod problem_details;
pub mod state;

// End of file: /src/config/mod.rs
