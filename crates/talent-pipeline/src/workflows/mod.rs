pub mod pipeline;
pub mod roster;
