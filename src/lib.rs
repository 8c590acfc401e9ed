//! Meal sharing service: hosts publish meals with a fixed number of seats,
//! guests reserve them, and no meal is ever booked past its capacity.

pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
