//! Window-side state.
//!
//! These types hold what each window displays and talk to the service only
//! through [`NoteApi`](crate::ipc::NoteApi), the way a front end would.

mod list;
mod pinned;

pub use list::NoteList;
pub use pinned::PinnedNoteView;
