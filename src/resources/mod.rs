//! Resource operations on [`crate::Client`]
//!
//! Each submodule adds an `impl Client` block for one API area, plus the
//! request/response types and page fetchers it needs.

pub mod accounts;
pub mod jobs;
pub mod posts;
pub mod users;
pub mod workspaces;

pub use accounts::{AccountPageFetcher, ListAccountsResponse};
pub use posts::{
    validate_post_id, AutoScheduleRequest, BulkPost, BulkPostsRequest, CreateDraftPostRequest,
    DeletePostResponse, ListPostsRequest, ListPostsResponse, PostIterator, PostPageFetcher,
    PublishPostRequest, RecurrenceRule, RecurringPostRequest, RecyclePostRequest,
    SchedulePostRequest, UpdatePostRequest, DRAFT_PRIVATE, DRAFT_PUBLIC,
};
pub use workspaces::{ListWorkspacesResponse, WorkspacePageFetcher};
