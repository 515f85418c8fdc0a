//! Game night building blocks.
//!
//! The plain state machines ([paginator], [lobby], [registry], [draft]) know
//! nothing about Discord. The `*_view` modules, [scroller] and [temp_voice]
//! drive them from interactions.

pub mod draft;
pub mod draft_view;
pub mod embeds;
pub mod lobby;
pub mod lobby_view;
pub mod paginator;
pub mod presses;
pub mod registry;
pub mod scroller;
pub mod temp_voice;
