//! Chat UI components: composer, transcript, and the manager gluing them
//! to the recommendation client.

pub mod commands;
pub mod composer;
pub mod manager;
pub mod transcript;

pub use commands::{ParsedCommand, SlashCommand, get_help_text};
pub use composer::ChatComposer;
pub use manager::ChatManager;
pub use transcript::Transcript;
