// Library exports for testing and embedding
pub mod audio;
pub mod auth;
pub mod clip;
pub mod config;
pub mod constants;
pub mod enrollment;
pub mod features;
pub mod pattern;
pub mod similarity;
pub mod spectral;
