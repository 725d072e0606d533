pub mod analysis;
pub mod cli;
pub mod overlay;
pub mod replay;
pub mod review_store;
pub mod shots;
pub mod web;
