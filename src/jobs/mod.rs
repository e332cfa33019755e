use indicatif::{ProgressBar, ProgressStyle};

pub mod author_ids;
pub mod author_olids;
pub mod editions;

/// Caps write-backs per catalog. Library and Knowledge Graph writes are
/// tracked separately and the job stops as soon as either counter reaches
/// the limit. Would-be writes under dry-run count too, so a rehearsal run
/// stops at the same point a live run would.
pub struct WriteLimiter {
    limit: Option<usize>,
    library_writes: usize,
    graph_writes: usize,
}

impl WriteLimiter {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            library_writes: 0,
            graph_writes: 0,
        }
    }

    pub fn record_library(&mut self) {
        self.library_writes += 1;
    }

    pub fn record_graph(&mut self) {
        self.graph_writes += 1;
    }

    pub fn reached(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.library_writes >= limit || self.graph_writes >= limit)
    }

    pub fn library_writes(&self) -> usize {
        self.library_writes
    }

    pub fn graph_writes(&self) -> usize {
        self.graph_writes
    }
}

pub fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta} @ {per_sec}) {msg}")
            .expect("Failed to create progress bar template")
            .progress_chars("=> "),
    );
    bar
}

pub fn progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("[{elapsed_precise}] {spinner} {pos} rows {msg}")
            .expect("Failed to create spinner template"),
    );
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_limiter_never_stops() {
        let mut limiter = WriteLimiter::new(None);
        for _ in 0..1000 {
            limiter.record_library();
            limiter.record_graph();
        }
        assert!(!limiter.reached());
    }

    #[test]
    fn stops_on_whichever_counter_hits_the_limit_first() {
        let mut limiter = WriteLimiter::new(Some(2));
        limiter.record_library();
        assert!(!limiter.reached());
        limiter.record_library();
        assert!(limiter.reached());
        assert_eq!(limiter.library_writes(), 2);
        assert_eq!(limiter.graph_writes(), 0);

        let mut limiter = WriteLimiter::new(Some(1));
        limiter.record_graph();
        assert!(limiter.reached());
    }
}
