pub mod page;
pub mod project;
pub mod task;
pub mod user;

pub use page::{Page, Paginated};
pub use project::Project;
pub use task::{NewTask, Task, TaskFilter, TaskPatch, TaskStatus};
pub use user::{Avatar, User, UserPatch};
