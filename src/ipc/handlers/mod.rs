pub mod chart;
pub mod core;
pub mod layout;
pub mod roster;
pub mod seats;
