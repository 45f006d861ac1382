/// Group count used when no configuration overrides it.
pub const DEFAULT_GROUP_COUNT: usize = 10;

/// A contiguous, immutable slice of the deduplicated URL list owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkGroup {
    index: usize,
    urls: Vec<String>,
}

impl WorkGroup {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Splits `urls` into exactly `group_count` contiguous groups whose sizes
/// differ by at most one. The first `len % group_count` groups take the extra
/// URL. Returns an empty vector when `group_count` is zero.
pub fn partition(urls: &[String], group_count: usize) -> Vec<WorkGroup> {
    if group_count == 0 {
        return Vec::new();
    }
    let base = urls.len() / group_count;
    let extra = urls.len() % group_count;

    let mut groups = Vec::with_capacity(group_count);
    let mut start = 0;
    for index in 0..group_count {
        let size = base + usize::from(index < extra);
        groups.push(WorkGroup {
            index,
            urls: urls[start..start + size].to_vec(),
        });
        start += size;
    }
    groups
}
