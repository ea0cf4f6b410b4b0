pub mod due;
pub mod repeat;
pub mod task;
pub mod user;

pub use due::TimeOfDay;
pub use repeat::{Repeat, WeekdayLabel};
pub use task::{Category, Kind, ListTab, Status, TaskDraft, TaskRecord, TypeFilter};
pub use user::{NewUser, User};
