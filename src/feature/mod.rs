//! One-off feature objects layered on the shared animation contract.

mod polaroid;
mod star;

pub use polaroid::{CardPart, GalleryChange, PhotoCard, PhotoGallery, PhotoRef, RESLOT_DAMPING};
pub use star::{Star, STAR_CHAOS_SCALE, STAR_GLOW_THRESHOLD};
