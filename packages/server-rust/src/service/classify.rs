//! Handler classification: decides which form a handler type takes.
//!
//! Classification runs an ordered list of recognizers and takes the first
//! match. The marker recognizer comes first, so a type that both carries the
//! marker and implements `Endpoint` is treated as annotation-described.

use wsmount_core::{HandlerClass, ServerEndpoint, Variant};

use super::error::ClassificationError;

/// Outcome of a successful classification.
#[derive(Debug, Clone, Copy)]
pub enum Recognized<'a> {
    /// The type carries this endpoint marker.
    Annotated(&'a ServerEndpoint),
    /// The type implements the `Endpoint` contract.
    Programmatic,
}

impl Recognized<'_> {
    #[must_use]
    pub fn variant(&self) -> Variant {
        match self {
            Self::Annotated(_) => Variant::AnnotationDescribed,
            Self::Programmatic => Variant::Programmatic,
        }
    }
}

/// Tests a handler type for one accepted form.
pub type Recognizer = for<'a> fn(&'a HandlerClass) -> Option<Recognized<'a>>;

/// Recognizers in precedence order.
pub const RECOGNIZERS: &[Recognizer] = &[recognize_annotated, recognize_programmatic];

/// Matches types carrying the server endpoint marker.
#[must_use]
pub fn recognize_annotated(class: &HandlerClass) -> Option<Recognized<'_>> {
    class.marker().map(Recognized::Annotated)
}

/// Matches types implementing the `Endpoint` contract.
#[must_use]
pub fn recognize_programmatic(class: &HandlerClass) -> Option<Recognized<'_>> {
    class.is_endpoint().then_some(Recognized::Programmatic)
}

/// Classifies `class` with the first recognizer that matches.
///
/// # Errors
///
/// Returns `ClassificationError` if no recognizer matches.
pub fn classify(class: &HandlerClass) -> Result<Recognized<'_>, ClassificationError> {
    RECOGNIZERS
        .iter()
        .find_map(|recognize| recognize(class))
        .ok_or(ClassificationError { class: class.id() })
}
