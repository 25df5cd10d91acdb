pub mod color;
pub mod geometry;
pub mod layout;
pub mod record;
pub mod scale;
pub mod transform;

pub use record::{Priority, Strand, TileRecord, Uid};

