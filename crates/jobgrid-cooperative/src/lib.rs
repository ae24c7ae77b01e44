//! jobgrid-cooperative — a single-driver scheduler for environments with no
//! thread pool.
//!
//! Work sits in two ordered stores and is pulled out by whichever thread
//! donates itself to the scheduler:
//!
//! ```text
//! CooperativeExecutor
//!   ├── ImmediateQueue (general)   descending priority, FIFO ties, no allocation
//!   ├── ImmediateQueue (main)      jobs for the designated serial context
//!   ├── DelayedQueue               ascending deadline
//!   └── Clock                      monotonic time + sleep
//! ```
//!
//! # Concurrency model
//!
//! Nothing here is synchronized. [`CooperativeExecutor`] is `!Send` and
//! `!Sync`, so it can only ever be driven from the thread that created it.

pub mod clock;
pub mod delayed;
pub mod executor;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use delayed::DelayedQueue;
pub use executor::{Claimed, CooperativeExecutor, DonationOutcome, DonationSummary};
pub use jobgrid_core::ImmediateQueue;
