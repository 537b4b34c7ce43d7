//! Process-wide state shared by the server and the actors.

mod state;

pub use state::{
    is_healthy, is_serving, is_shutdown, register_server, set_healthy, set_serving,
    setup_shutdown_handler,
};
