//! Flattens merged data into the token tables the renderer consumes.
//!
//! Text and images are mapped separately: [`map_text`] walks the schema and
//! produces `token -> string`, [`map_images`] pairs the image-size table with
//! the images a caller supplied.

mod image;
mod text;

pub use image::{ImageInput, ImageMap, map_images};
pub use text::{TextMap, map_text, normalize_newlines, stringify};
