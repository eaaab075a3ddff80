//! Data and behaviours modelled as objects.

pub mod category;
pub mod content;

pub use self::{
    category::{Category, NewCategory},
    content::{ContentItem, NewContent},
};
