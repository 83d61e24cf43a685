// Start of file: /src/routes/mod.rs

pub mod fallback_handler;

// End of file: /src/routes/mod.rs
