use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Local, NaiveDate, Utc};

static LAST_TIMESTAMP_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond creation timestamp used as a record key.
///
/// Keys are strictly increasing across the process, so two records created in the same
/// millisecond still get distinct ids.
pub fn next_timestamp_id() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_TIMESTAMP_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_TIMESTAMP_ID.compare_exchange_weak(
            last,
            candidate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(observed) => last = observed,
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
