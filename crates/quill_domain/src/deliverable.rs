use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// The formats produced by the multi-output writer, in the order they must
/// appear in the model response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliverableKind {
    ExecutiveSummary,
    DetailedReport,
    ActionItems,
}

impl DeliverableKind {
    /// Section marker the model is instructed to emit before this format.
    pub const fn marker(&self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "===EXECUTIVE_SUMMARY===",
            Self::DetailedReport => "===DETAILED_REPORT===",
            Self::ActionItems => "===ACTION_ITEMS===",
        }
    }
}
