pub mod assignment;
pub mod order;
pub mod settlement;
pub mod station;
pub mod trust;
