pub mod api;
pub mod api_doc;
pub mod live;
pub mod server;
pub mod ui;

pub use live::LiveFrame;
pub use server::{bind, run_server, AppState};
