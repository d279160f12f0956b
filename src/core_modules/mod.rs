pub mod classifier;
pub mod graph;
pub mod grid;
pub mod grid_graph;
pub mod pathfinder;
pub mod pixel;
pub mod rag;
pub mod raster;
pub mod segmenter;
pub mod superpixel;
