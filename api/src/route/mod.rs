pub mod access;
pub mod auth;
pub mod health;
pub mod reservation;
pub mod spot;
pub mod v1;
pub mod vehicle;
