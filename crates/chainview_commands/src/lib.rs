//! Interactive commands over the chainview tree. The host editor wires its
//! prompt primitives into [`chainview_core::UserInteraction`] and hands the
//! collaborators to [`ServiceCommands`].

pub mod service_commands;

pub use service_commands::{ConnectError, ServiceCommands};
