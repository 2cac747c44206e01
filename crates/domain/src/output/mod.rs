mod channel;
mod pins;
mod state;

pub use channel::{CHANNEL_COUNT, OutputChannel};
pub use pins::OutputPins;
pub use state::OutputState;
