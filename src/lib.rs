pub mod board;
pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod store;
pub mod tui;
pub mod utils;

pub use board::{Board, BoardError, Screen};
pub use config::{Backend, Config};
pub use models::{Column, Comment, Task, User};
pub use store::{Store, StoreError};
pub use utils::Profile;
