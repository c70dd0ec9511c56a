pub mod account;
pub mod common;
pub mod image;
pub mod text;

pub use account::*;
pub use common::*;
pub use image::*;
pub use text::*;
