pub mod config;
pub mod dataset;
pub mod error;
pub mod organize;
pub mod reformat;
pub mod source;
pub mod splitter;
pub mod writer;

pub use dataset::{Cutoff, GroupKey, KeyValue, Partition};
pub use error::{PipelineError, SplitError};
pub use splitter::{split_by_group, GroupedSplit, GroupedTimeSplitter};
