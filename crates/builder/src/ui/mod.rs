pub mod properties;
pub mod status_bar;
pub mod toolbar;
pub mod welcome;
