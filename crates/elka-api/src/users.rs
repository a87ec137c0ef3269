// Admin user endpoints.

use serde::Deserialize;

use crate::client::ApiClient;
use crate::models::{Pagination, UserProfile};
use crate::Error;

/// The admin listing is served either as a bare array or as a page object.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserListing {
    Plain(Vec<UserProfile>),
    Page {
        #[serde(alias = "items")]
        users: Vec<UserProfile>,
    },
}

impl ApiClient {
    /// `GET /admin/users/` (admin only).
    pub async fn admin_list_users(&self, page: Pagination) -> Result<Vec<UserProfile>, Error> {
        let listing: UserListing = self.get("/admin/users/", page.to_query(), true).await?;
        Ok(match listing {
            UserListing::Plain(users) | UserListing::Page { users } => users,
        })
    }
}
