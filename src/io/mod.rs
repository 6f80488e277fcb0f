//! Input readers.
//!
//! - CSV rows with a `Time` column (`ingest`)
//! - the production file (`production`)
//! - per-horizon forecast files (`weather`)

pub mod ingest;
pub mod production;
pub mod weather;

pub use ingest::*;
pub use production::*;
pub use weather::*;
