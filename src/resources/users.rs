//! User operations

use crate::client::Client;
use crate::context::Context;
use crate::error::Result;
use crate::types::User;

impl Client {
    /// The user owning the API key
    pub async fn me(&self, ctx: &Context) -> Result<User> {
        self.http().get_json(ctx, "users/me").await
    }
}
