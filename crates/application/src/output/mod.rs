mod bank;

pub use bank::OutputBank;
