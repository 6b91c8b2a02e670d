pub mod base;
pub mod reservation;
pub mod selection;
pub mod token;
