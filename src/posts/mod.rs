// src/posts/mod.rs

// Write-ups that run systems and lay their outcomes out as chart data.
// Each post is gated on the feature of the system(s) it runs.

pub mod sdk;
pub use sdk::*;

#[cfg(feature = "post-inventory")]
pub mod inventory;

#[cfg(feature = "post-walks")]
pub mod walks;
