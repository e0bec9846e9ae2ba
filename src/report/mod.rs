//! Sprint-report pipeline: derive counts and groupings from a sprint payload,
//! filter and search the issue list, export the result as CSV.

pub mod derive;
pub mod export;
pub mod filter;
