/// Process-wide counters for bootstrap runs.
pub mod bootstrap_counters {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::info;

    static RUNS_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static STEPS_APPLIED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static STEPS_SKIPPED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static MISDIRECTED_INDEXES_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static AUTH_REJECTED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static BOOTSTRAP_FAILED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static POSTCHECK_MISMATCH_TOTAL: AtomicUsize = AtomicUsize::new(0);

    pub fn run_started() {
        RUNS_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_steps_applied(n: usize) {
        STEPS_APPLIED_TOTAL.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_steps_skipped(n: usize) {
        STEPS_SKIPPED_TOTAL.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_misdirected_indexes(n: usize) {
        MISDIRECTED_INDEXES_TOTAL.fetch_add(n, Ordering::Relaxed);
    }

    pub fn auth_rejected() {
        AUTH_REJECTED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bootstrap_failed() {
        BOOTSTRAP_FAILED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn postcheck_mismatch() {
        POSTCHECK_MISMATCH_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Snapshot {
        pub runs_total: usize,
        pub steps_applied_total: usize,
        pub steps_skipped_total: usize,
        pub misdirected_indexes_total: usize,
        pub auth_rejected_total: usize,
        pub bootstrap_failed_total: usize,
        pub postcheck_mismatch_total: usize,
    }

    pub fn snapshot() -> Snapshot {
        Snapshot {
            runs_total: RUNS_TOTAL.load(Ordering::Relaxed),
            steps_applied_total: STEPS_APPLIED_TOTAL.load(Ordering::Relaxed),
            steps_skipped_total: STEPS_SKIPPED_TOTAL.load(Ordering::Relaxed),
            misdirected_indexes_total: MISDIRECTED_INDEXES_TOTAL.load(Ordering::Relaxed),
            auth_rejected_total: AUTH_REJECTED_TOTAL.load(Ordering::Relaxed),
            bootstrap_failed_total: BOOTSTRAP_FAILED_TOTAL.load(Ordering::Relaxed),
            postcheck_mismatch_total: POSTCHECK_MISMATCH_TOTAL.load(Ordering::Relaxed),
        }
    }

    pub fn log_snapshot(context: &str) {
        let s = snapshot();
        info!(
            context = context,
            runs = s.runs_total,
            steps_applied = s.steps_applied_total,
            steps_skipped = s.steps_skipped_total,
            misdirected_indexes = s.misdirected_indexes_total,
            auth_rejected = s.auth_rejected_total,
            failed = s.bootstrap_failed_total,
            postcheck_mismatch = s.postcheck_mismatch_total,
            "bootstrap counters"
        );
    }
}
