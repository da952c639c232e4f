pub mod colormap;
pub mod config;
pub mod controls;
pub mod draw;
pub mod error;
pub mod export;
pub mod expr;
pub mod format;
pub mod geometry;
pub mod layers;
pub mod map;
pub mod measure;
pub mod projection;
pub mod raster;
pub mod sphere;
pub mod tooltip;
pub mod view;
pub mod window;

pub use error::{Error, Result};
