//! GeoTIFF I/O for land/ocean layers and per-point debug dumps

mod native;

pub use native::{read_geotiff, write_geotiff, GeoTiffOptions};
