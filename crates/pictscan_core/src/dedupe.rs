use std::collections::HashSet;

/// Unique URLs in first-occurrence order plus the number of dropped repeats.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deduped {
    pub urls: Vec<String>,
    pub duplicates: usize,
}

/// Collapses repeated URLs. Comparison is exact string equality; no
/// normalization is applied.
pub fn dedupe_urls<I, S>(raw: I) -> Deduped
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut deduped = Deduped::default();
    for url in raw {
        let url = url.into();
        if seen.insert(url.clone()) {
            deduped.urls.push(url);
        } else {
            deduped.duplicates += 1;
        }
    }
    deduped
}
