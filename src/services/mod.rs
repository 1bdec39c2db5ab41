//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the submit-and-relay logic so route handlers stay
//! focused on protocol translation.

pub mod research;
