pub mod acquisition;
pub mod display;
