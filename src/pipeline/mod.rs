pub mod archive;
pub mod collector;
pub mod compiler;
pub mod context;
pub mod generator;
pub mod normalizer;
pub mod packager;
