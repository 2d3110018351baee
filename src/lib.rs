pub mod logger;
pub mod animation;
pub mod state_machine;
pub mod physics;
