pub mod device;
pub mod model;
pub mod repository;
