//! Core data models for the meta finder.

mod card;
mod deck;
mod player;
mod tag;

pub use card::*;
pub use deck::*;
pub use player::*;
pub use tag::*;
