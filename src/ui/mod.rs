pub mod files;
pub mod panels;
pub mod plot;
pub mod preview;
