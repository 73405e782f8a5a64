pub mod certificates;
pub mod donated_back;
pub mod donations;
pub mod keys;
pub mod reports;
pub mod stats;
pub mod theme;
