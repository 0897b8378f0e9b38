use reqwest::Method;
use tracing::{instrument, warn};

use crate::{
    api::{DataPage, Model, ModelInfo, MonthlyUsage, NewToken, Token, User, VectorSpaceInfo},
    client::Vecto,
    config::TokenKind,
    decode::decode,
    encode,
    error::Result,
    transport::Body,
};

const MODEL_PATH: &str = "api/v0/account/model";
const SPACE_PATH: &str = "api/v0/account/space";
const USER_PATH: &str = "api/v0/account/user";
const TOKENS_PATH: &str = "api/v0/account/tokens";

/// Space lifecycle and account operations. These use the management token.
impl Vecto {
    async fn management(
        &self,
        operation: &'static str,
        method: Method,
        path: String,
        query: Vec<(String, String)>,
        body: Body,
    ) -> Result<serde_json::Value> {
        self.call(operation, method, path, query, TokenKind::Management, body)
            .await
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let operation = "list_models";
        let value = self
            .management(operation, Method::GET, MODEL_PATH.into(), vec![], Body::Empty)
            .await?;
        decode(operation, value)
    }

    pub async fn list_vector_spaces(&self) -> Result<Vec<VectorSpaceInfo>> {
        let operation = "list_vector_spaces";
        let value = self
            .management(operation, Method::GET, SPACE_PATH.into(), vec![], Body::Empty)
            .await?;
        decode(operation, value)
    }

    pub async fn get_vector_space(&self, id: u64) -> Result<VectorSpaceInfo> {
        let operation = "get_vector_space";
        let value = self
            .management(
                operation,
                Method::GET,
                format!("{SPACE_PATH}/{id}"),
                vec![],
                Body::Empty,
            )
            .await?;
        decode(operation, value)
    }

    /// Every space called `name`, in service order. Names are not unique.
    #[instrument(skip(self))]
    pub async fn get_vector_space_by_name(&self, name: &str) -> Result<Vec<VectorSpaceInfo>> {
        let operation = "get_vector_space_by_name";
        let value = self
            .management(operation, Method::GET, SPACE_PATH.into(), vec![], Body::Empty)
            .await?;
        let spaces: Vec<VectorSpaceInfo> = decode(operation, value)?;
        let matching: Vec<_> = spaces.into_iter().filter(|s| s.name == name).collect();
        if matching.len() > 1 {
            warn!(
                count = matching.len(),
                "multiple vector spaces share this name"
            );
        }
        Ok(matching)
    }

    #[instrument(skip(self))]
    pub async fn create_vector_space(&self, name: &str, model: Model) -> Result<VectorSpaceInfo> {
        let operation = "create_vector_space";
        let body = encode::create_space_body(operation, name, model)?;
        let value = self
            .management(
                operation,
                Method::POST,
                SPACE_PATH.into(),
                vec![],
                Body::Json(body),
            )
            .await?;
        decode(operation, value)
    }

    #[instrument(skip(self))]
    pub async fn rename_vector_space(&self, id: u64, name: &str) -> Result<VectorSpaceInfo> {
        let operation = "rename_vector_space";
        let body = encode::rename_space_body(operation, name)?;
        let value = self
            .management(
                operation,
                Method::PUT,
                format!("{SPACE_PATH}/{id}"),
                vec![],
                Body::Json(body),
            )
            .await?;
        decode(operation, value)
    }

    /// Deletes the space and everything ingested into it.
    #[instrument(skip(self))]
    pub async fn delete_vector_space(&self, id: u64) -> Result<()> {
        self.management(
            "delete_vector_space",
            Method::DELETE,
            format!("{SPACE_PATH}/{id}"),
            vec![],
            Body::Empty,
        )
        .await?;
        Ok(())
    }

    /// One page of the entries stored in a space.
    pub async fn list_vector_space_data(
        &self,
        space_id: u64,
        limit: u32,
        offset: u32,
    ) -> Result<DataPage> {
        let operation = "list_vector_space_data";
        let value = self
            .management(
                operation,
                Method::GET,
                format!("{SPACE_PATH}/{space_id}/data"),
                vec![
                    ("limit".to_string(), limit.to_string()),
                    ("offset".to_string(), offset.to_string()),
                ],
                Body::Empty,
            )
            .await?;
        decode(operation, value)
    }

    #[instrument(skip(self))]
    pub async fn delete_vector_space_entry(&self, space_id: u64, entry_id: u64) -> Result<()> {
        self.management(
            "delete_vector_space_entry",
            Method::DELETE,
            format!("{SPACE_PATH}/{space_id}/data/{entry_id}"),
            vec![],
            Body::Empty,
        )
        .await?;
        Ok(())
    }

    /// Lookup and indexing counts for one month.
    pub async fn usage(&self, space_id: u64, year: u32, month: u32) -> Result<MonthlyUsage> {
        let operation = "usage";
        let value = self
            .management(
                operation,
                Method::GET,
                format!("{SPACE_PATH}/{space_id}/usage"),
                vec![
                    ("year".to_string(), year.to_string()),
                    ("month".to_string(), month.to_string()),
                ],
                Body::Empty,
            )
            .await?;
        decode(operation, value)
    }

    pub async fn get_user_information(&self) -> Result<User> {
        let operation = "get_user_information";
        let value = self
            .management(operation, Method::GET, USER_PATH.into(), vec![], Body::Empty)
            .await?;
        decode(operation, value)
    }

    pub async fn list_tokens(&self) -> Result<Vec<Token>> {
        let operation = "list_tokens";
        let value = self
            .management(operation, Method::GET, TOKENS_PATH.into(), vec![], Body::Empty)
            .await?;
        decode(operation, value)
    }

    /// Creates an access token. The secret is only returned here.
    #[instrument(skip(self, vector_space_ids))]
    pub async fn create_token(
        &self,
        name: &str,
        token_type: &str,
        vector_space_ids: &[u64],
        all_vector_spaces: bool,
    ) -> Result<NewToken> {
        let operation = "create_token";
        let body = encode::create_token_body(
            operation,
            name,
            token_type,
            vector_space_ids,
            all_vector_spaces,
        )?;
        let value = self
            .management(
                operation,
                Method::POST,
                TOKENS_PATH.into(),
                vec![],
                Body::Json(body),
            )
            .await?;
        decode(operation, value)
    }

    #[instrument(skip(self))]
    pub async fn delete_token(&self, id: u64) -> Result<()> {
        self.management(
            "delete_token",
            Method::DELETE,
            format!("{TOKENS_PATH}/{id}"),
            vec![],
            Body::Empty,
        )
        .await?;
        Ok(())
    }
}
