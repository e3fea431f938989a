//! I/O for vector survey sources.

#[cfg(feature = "gdal")]
mod gdal_io;
mod geojson_io;

#[cfg(feature = "gdal")]
pub use gdal_io::read_vector;
pub use geojson_io::{parse_geojson, read_geojson};
