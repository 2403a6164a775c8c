pub mod access;
pub mod auth;
pub mod reservation;
pub mod spot;
pub mod vehicle;
