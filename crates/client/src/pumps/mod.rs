//! Background tasks that move frames between the socket and the session.

pub(crate) mod read;
pub(crate) mod write;
