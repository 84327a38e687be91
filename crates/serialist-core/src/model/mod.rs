//! Domain records: the continuity document and the chapter pack.

pub mod pack;
pub mod state;

pub use pack::{ChapterPack, CharacterUpdate, NextChapterPlan};
pub use state::{ContinuityState, PlotThread, Progress, ProjectMeta, TimelineEvent};
