//! Detection of `<picture>` elements whose unsized `<source>` candidates sit
//! next to an `<img>` with a customized `sizes` hint.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html};

/// `sizes` value treated as the trivial full-viewport default.
pub const DEFAULT_SIZES: &str = "100vw";

/// Returns `true` when the document has at least one matching picture.
pub fn classify(document: &Html) -> bool {
    !matching_pictures(document).is_empty()
}

/// Pictures that contain a candidate source and whose first `<img>` carries a
/// non-empty `sizes` other than [`DEFAULT_SIZES`], in document order.
pub fn matching_pictures(document: &Html) -> Vec<ElementRef<'_>> {
    candidate_pictures(document)
        .into_iter()
        .filter(|picture| {
            first_image(*picture)
                .and_then(|img| img.value().attr("sizes"))
                .is_some_and(|sizes| !sizes.is_empty() && sizes != DEFAULT_SIZES)
        })
        .collect()
}

/// The `<img>` a matching picture falls back to.
pub fn first_image(picture: ElementRef<'_>) -> Option<ElementRef<'_>> {
    picture
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "img")
}

/// Unique nearest `<picture>` ancestors of candidate sources, deduplicated by
/// node identity.
fn candidate_pictures(document: &Html) -> Vec<ElementRef<'_>> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| is_candidate_source(*el))
        .filter_map(nearest_picture)
        .filter(|picture| seen.insert(picture.id()))
        .collect()
}

/// `<source>` with a non-empty `srcset` and no `sizes` attribute at all.
fn is_candidate_source(element: ElementRef<'_>) -> bool {
    let el = element.value();
    el.name() == "source"
        && el.attr("srcset").is_some_and(|srcset| !srcset.is_empty())
        && el.attr("sizes").is_none()
}

fn nearest_picture(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "picture")
}
