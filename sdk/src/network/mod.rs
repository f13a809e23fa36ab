pub(crate) mod runner;
pub(crate) mod send_queue;
pub(crate) mod tcp_transport;

pub use runner::{spawn, Command, QsoHandle};
pub use tcp_transport::TcpTransport;
