//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use rmguard::prelude::*;
//! ```

// Core
pub use crate::config::Config;
pub use crate::errors::{Result, RgError};
pub use crate::pipeline::{run, PipelineOutcome};

// Envelope
pub use crate::envelope::Envelope;

// Classifier
pub use crate::classifier::{classify, Classification, Target, Tier};

// Zone
pub use crate::zone::{classify as classify_zone, ZoneLabel};

// Gate
pub use crate::gate::{build_explanation, decide, prompt, GateDecision, LabeledTarget};

// Backup
pub use crate::backup::{run as run_backup, BackupOutcome, BackupRecord};
