// Handlers module

pub mod bunnies;
pub mod messages;
pub mod ping;
pub mod rejection;
pub mod threads;

pub use bunnies::{create_bunny_handler, list_bunnies_handler};
pub use messages::create_message_handler;
pub use ping::ping_handler;
pub use rejection::handle_rejection;
pub use threads::{add_message_handler, get_thread_handler};
