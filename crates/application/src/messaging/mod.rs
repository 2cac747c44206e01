mod control_listener;

pub use control_listener::ControlListener;
