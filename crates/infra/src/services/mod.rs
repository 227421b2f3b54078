mod workspace;

pub use workspace::{
    ApiError, DeliveryReceipt, IWorkspaceApi, InMemoryWorkspaceApi, UserProfile, WorkspaceRestApi,
};
