pub mod access;
pub mod auth;
pub mod detection;
pub mod id;
pub mod plate;
pub mod reservation;
pub mod spot;
pub mod vehicle;
pub mod window;
