//! Outgoing message assembly

pub mod builder;

pub use builder::MessageBuilder;
