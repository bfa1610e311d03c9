//! These models represent the objects passed between the drivers, the
//! dispatcher and the model provider.
//!
//! Provider wire formats are converted into these structs as soon as a
//! response arrives, and back again only when the next request is built.
pub mod message;
pub mod role;
pub mod tool;
