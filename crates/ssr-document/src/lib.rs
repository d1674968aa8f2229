//! HTML document assembly for server rendering.
//!
//! This crate turns render results into the final document:
//! - `DocumentAssembler` - Structural text substitution into the HTML template
//! - `render_preload_links` - Preload markup for resolved dependencies
//! - `StateCodec` - Initial-state encoding safe for inline scripts

mod assembler;
mod preload;
mod state;

pub use assembler::*;
pub use preload::*;
pub use state::*;
