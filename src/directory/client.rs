//! HTTP client for the directory management API.

use crate::config::DirectoryConfig;
use crate::directory::DirectoryService;
use crate::error::SyncError;
use crate::models::{SyncMethod, SyncOperation};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

pub struct HttpDirectoryClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl HttpDirectoryClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self, SyncError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let base_url = config.normalized_base_url();
        info!("Directory service: {}", base_url);

        Ok(Self {
            http_client,
            base_url,
            timeout_seconds: config.timeout_seconds,
        })
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryClient {
    async fn send(&self, operation: &SyncOperation) -> Result<Option<u16>, SyncError> {
        let url = format!("{}{}", self.base_url, operation.call.path());
        let request = match operation.call.method() {
            SyncMethod::Create => self.http_client.post(&url),
            SyncMethod::Delete => self.http_client.delete(&url),
        };

        let response = request
            .query(&operation.query_params())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::Timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    SyncError::Transport(format!("cannot connect to {}", self.base_url))
                } else {
                    SyncError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            info!(
                "{} {} user={} target={} -> {}",
                operation.call,
                url,
                operation.principal_id,
                operation.target_id,
                status.as_u16()
            );
        } else {
            warn!(
                "{} {} user={} target={} -> {}",
                operation.call,
                url,
                operation.principal_id,
                operation.target_id,
                status.as_u16()
            );
        }

        Ok(Some(status.as_u16()))
    }
}

/// Stand-in used when mirroring is turned off.
pub struct DisabledDirectory;

#[async_trait]
impl DirectoryService for DisabledDirectory {
    async fn send(&self, operation: &SyncOperation) -> Result<Option<u16>, SyncError> {
        info!(
            "Directory sync disabled, skipping {} user={} target={}",
            operation.call, operation.principal_id, operation.target_id
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DirectoryCall, MutationIntent};
    use crate::testing::spawn_http_fixture;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::{delete, post};
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn operation(call: DirectoryCall, intent: MutationIntent) -> SyncOperation {
        SyncOperation {
            intent,
            call,
            principal_id: "user-1".to_string(),
            target_id: "target-1".to_string(),
        }
    }

    fn client_for(base_url: String, timeout_seconds: u64) -> HttpDirectoryClient {
        HttpDirectoryClient::new(&DirectoryConfig {
            base_url,
            timeout_seconds,
            enabled: true,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_to_group_posts_query_params() {
        let seen: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
        let captured = seen.clone();
        let router = Router::new().route(
            "/api/addUserToGroup",
            post(move |Query(params): Query<HashMap<String, String>>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push(params);
                    StatusCode::CREATED
                }
            }),
        );
        let client = client_for(spawn_http_fixture(router).await, 5);

        let status = client
            .send(&operation(
                DirectoryCall::AddPrincipalToGroup,
                MutationIntent::GroupMembershipAdd,
            ))
            .await
            .unwrap();

        assert_eq!(status, Some(201));
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0]["groupId"], "target-1");
        assert_eq!(seen[0]["userId"], "user-1");
    }

    #[tokio::test]
    async fn test_remove_role_uses_delete() {
        let seen: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
        let captured = seen.clone();
        let router = Router::new().route(
            "/api/removeRoleFromUser",
            delete(move |Query(params): Query<HashMap<String, String>>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push(params);
                    StatusCode::NO_CONTENT
                }
            }),
        );
        let client = client_for(spawn_http_fixture(router).await, 5);

        let status = client
            .send(&operation(
                DirectoryCall::RemoveRoleFromPrincipal,
                MutationIntent::RoleAssignmentRemove,
            ))
            .await
            .unwrap();

        assert_eq!(status, Some(204));
        assert_eq!(seen.lock().unwrap()[0]["roleId"], "target-1");
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let router = Router::new().route(
            "/api/assignDirectoryRoleToUser",
            post(|| async { (StatusCode::NOT_FOUND, "no such role") }),
        );
        let client = client_for(spawn_http_fixture(router).await, 5);

        let status = client
            .send(&operation(
                DirectoryCall::AssignRoleToPrincipal,
                MutationIntent::RoleAssignmentAdd,
            ))
            .await
            .unwrap();
        assert_eq!(status, Some(404));
    }

    #[tokio::test]
    async fn test_slow_directory_times_out() {
        let router = Router::new().route(
            "/api/removeUserFromGroup",
            delete(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                StatusCode::OK
            }),
        );
        let client = client_for(spawn_http_fixture(router).await, 1);

        let err = client
            .send(&operation(
                DirectoryCall::RemovePrincipalFromGroup,
                MutationIntent::GroupMembershipRemove,
            ))
            .await
            .unwrap_err();
        assert_eq!(err, SyncError::Timeout(1));
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}", addr), 2);
        let err = client
            .send(&operation(
                DirectoryCall::AddPrincipalToGroup,
                MutationIntent::GroupMembershipAdd,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }

    #[tokio::test]
    async fn test_disabled_directory_sends_nothing() {
        let status = DisabledDirectory
            .send(&operation(
                DirectoryCall::AddPrincipalToGroup,
                MutationIntent::GroupMembershipAdd,
            ))
            .await
            .unwrap();
        assert_eq!(status, None);
    }
}
