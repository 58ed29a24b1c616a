pub mod geometry_loader;
