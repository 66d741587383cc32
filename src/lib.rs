//! Reader for a telescope/simulation event-data container.
//!
//! The container is a sequential stream of framed, typed, versioned
//! blocks: run-level configuration first, then interleaved Monte-Carlo
//! truth and triggered array events. [`SimtelFile`] decodes blocks on
//! demand as it advances and answers queries from the last committed
//! state; unknown block types are skipped so newer streams stay readable.
//!
//! ```no_run
//! use simtelio::SimtelFile;
//!
//! # fn main() -> simtelio::Result<()> {
//! let mut file = SimtelFile::open("run31964.simtel")?;
//! while let Some(event_id) = file.next_event()? {
//!     let run = file.run_number()?;
//!     for tel_id in file.teldata_list()? {
//!         let sums = file.adc_sum(tel_id)?;
//!         println!("run {run} event {event_id} tel {tel_id}: {} pixels", sums.ncols());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod global;
pub mod parser;
pub mod simtel_file;
pub mod types;

pub use errors::{Result, SimtelError};
pub use simtel_file::{EventIter, SimtelFile};
pub use types::{CameraGeometry, McRunHeader, PixelSettings, RunConfig};
