//! Core bibliographic data structures

mod entity;
mod reference;
mod result;

#[cfg(test)]
mod tests;

pub use entity::{Entity, EntityError, EntityIdentifier, MAIN_IDENTIFIER_PRIORITY};
pub use reference::{
    Abstract, Book, Concept, Contribution, Contributor, DocumentType, Issue, Journal, LiteralText,
    Reference, ReferenceIdentifier, ReferenceManifestation, Subtitle, Title,
};
pub use result::SimilarityResult;
