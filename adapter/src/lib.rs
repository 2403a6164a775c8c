pub mod access_client;
pub mod camera;
pub mod database;
pub mod detector;
pub mod gate;
pub mod redis;
pub mod repository;
