//! Marketplace data model

pub mod comment;
pub mod listing;
pub mod user;

pub use comment::Comment;
pub use listing::{Listing, ListingChanges, ListingDraft, NewListing};
pub use user::{NewUser, User};
