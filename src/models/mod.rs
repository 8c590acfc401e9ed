pub mod meal;
pub mod reservation;
pub mod review;
pub mod timestamp;
