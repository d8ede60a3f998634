pub(crate) mod clip;
pub(crate) mod frame;
pub(crate) mod gl;
pub(crate) mod image;
pub(crate) mod kenburns;
pub(crate) mod raster;
pub(crate) mod svg;
pub(crate) mod video;
