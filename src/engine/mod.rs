pub mod cache;
pub mod catalog;
pub mod cod;
pub mod selector;
pub mod settlement;
