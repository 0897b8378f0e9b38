use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::instrument;

use crate::{
    api::{
        AnalogyPair, AnalogyResult, AttributeUpdate, EmbeddingUpdate, IngestItem, IngestResponse,
        LookupResult,
    },
    config::{default_config, Config, TokenKind},
    decode, encode,
    error::{Result, VectoError},
    source::{Content, ImageSource},
    transport::{ApiRequest, Bearer, Body, HttpTransport, MultipartForm, Transport},
    vector_space::VectorSpace,
};

const INDEX_PATH: &str = "api/v0/index";
const LOOKUP_PATH: &str = "api/v0/lookup";
const UPDATE_VECTORS_PATH: &str = "api/v0/update/vectors";
const UPDATE_ATTRIBUTES_PATH: &str = "api/v0/update/attributes";
const ANALOGY_PATH: &str = "api/v0/analogy";
const DELETE_PATH: &str = "api/v0/delete";
const DELETE_ALL_PATH: &str = "api/v0/delete_all";

/// The low-level client: one method per remote operation, each a single
/// request. Clones are reference counted and share the connection pool.
#[derive(Clone)]
pub struct Vecto {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Vecto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vecto").field("config", &self.config).finish()
    }
}

impl Vecto {
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.base_url, config.timeout)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Builds a client from `VECTO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// Builds a client from the config installed with [`crate::set_default_config`].
    pub fn from_default() -> Result<Self> {
        let config = default_config()
            .cloned()
            .ok_or_else(|| VectoError::Config("no default config installed".to_string()))?;
        Self::new(config)
    }

    pub fn with_transport(config: Config, transport: impl Transport) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    /// A client that sends `kind` requests with `token` instead, sharing
    /// this client's transport.
    pub fn with_token(&self, kind: TokenKind, token: impl Into<String>) -> Self {
        let mut config = (*self.config).clone();
        match kind {
            TokenKind::User => config.user_token = Some(token.into()),
            TokenKind::Management => config.management_token = Some(token.into()),
        }
        Self {
            config: Arc::new(config),
            transport: self.transport.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A handle on the vector space called `name`, resolved on first use.
    pub fn vector_space(&self, name: impl Into<String>) -> VectorSpace {
        VectorSpace::new(self.clone(), name)
    }

    pub(crate) async fn call(
        &self,
        operation: &'static str,
        method: Method,
        path: String,
        query: Vec<(String, String)>,
        kind: TokenKind,
        body: Body,
    ) -> Result<Value> {
        let token = self.config.token(kind).map_err(|e| match e {
            VectoError::Config(message) => {
                VectoError::Config(format!("{operation}: {message}"))
            }
            other => other,
        })?;
        let bearer = Bearer::new(token);
        self.transport
            .send(ApiRequest {
                operation,
                method,
                path,
                query,
                bearer,
                body,
            })
            .await
    }

    async fn post_form(
        &self,
        operation: &'static str,
        path: &str,
        form: MultipartForm,
    ) -> Result<Value> {
        self.call(
            operation,
            Method::POST,
            path.to_string(),
            Vec::new(),
            TokenKind::User,
            Body::Multipart(form),
        )
        .await
    }

    /// Ingests a batch in one request. All items must share a modality.
    #[instrument(skip_all, fields(space_id = space_id, batch = items.len()))]
    pub async fn ingest(&self, space_id: u64, items: Vec<IngestItem>) -> Result<IngestResponse> {
        self.ingest_as("ingest", space_id, items).await
    }

    pub(crate) async fn ingest_as(
        &self,
        operation: &'static str,
        space_id: u64,
        items: Vec<IngestItem>,
    ) -> Result<IngestResponse> {
        let submitted = items.len();
        let form = encode::ingest_form(operation, space_id, items).await?;
        let value = self.post_form(operation, INDEX_PATH, form).await?;
        decode::ingest_response(operation, value, submitted)
    }

    /// Ingests texts, pairing `attributes[i]` with `texts[i]`.
    #[instrument(skip_all, fields(space_id = space_id, batch = texts.len()))]
    pub async fn ingest_text(
        &self,
        space_id: u64,
        texts: Vec<String>,
        attributes: Vec<Value>,
    ) -> Result<IngestResponse> {
        let contents = texts.into_iter().map(Content::Text).collect();
        let items = encode::pair_items("ingest_text", contents, attributes)?;
        self.ingest_as("ingest_text", space_id, items).await
    }

    /// Ingests images, pairing `attributes[i]` with `images[i]`.
    #[instrument(skip_all, fields(space_id = space_id, batch = images.len()))]
    pub async fn ingest_image(
        &self,
        space_id: u64,
        images: Vec<ImageSource>,
        attributes: Vec<Value>,
    ) -> Result<IngestResponse> {
        let contents = images.into_iter().map(Content::Image).collect();
        let items = encode::pair_items("ingest_image", contents, attributes)?;
        self.ingest_as("ingest_image", space_id, items).await
    }

    /// Nearest neighbours of `query`, best first. `ids` restricts the search
    /// to those vectors.
    #[instrument(skip_all, fields(space_id = space_id, top_k = top_k))]
    pub async fn lookup(
        &self,
        space_id: u64,
        query: Content,
        top_k: u32,
        ids: Option<&[u64]>,
    ) -> Result<Vec<LookupResult>> {
        self.lookup_as("lookup", space_id, query, top_k, ids).await
    }

    async fn lookup_as(
        &self,
        operation: &'static str,
        space_id: u64,
        query: Content,
        top_k: u32,
        ids: Option<&[u64]>,
    ) -> Result<Vec<LookupResult>> {
        let form = encode::lookup_form(operation, space_id, query, top_k, ids).await?;
        let value = self.post_form(operation, LOOKUP_PATH, form).await?;
        decode::lookup_results(operation, value)
    }

    pub async fn lookup_text(
        &self,
        space_id: u64,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<LookupResult>> {
        self.lookup_as("lookup_text", space_id, Content::from(query), top_k, None)
            .await
    }

    pub async fn lookup_image(
        &self,
        space_id: u64,
        query: ImageSource,
        top_k: u32,
    ) -> Result<Vec<LookupResult>> {
        self.lookup_as("lookup_image", space_id, Content::Image(query), top_k, None)
            .await
    }

    /// Replaces the embeddings of existing vectors. All updates must share a modality.
    #[instrument(skip_all, fields(space_id = space_id, batch = updates.len()))]
    pub async fn update_vector_embeddings(
        &self,
        space_id: u64,
        updates: Vec<EmbeddingUpdate>,
    ) -> Result<()> {
        let operation = "update_vector_embeddings";
        let form = encode::update_vectors_form(operation, space_id, updates).await?;
        self.post_form(operation, UPDATE_VECTORS_PATH, form).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(space_id = space_id, batch = updates.len()))]
    pub async fn update_vector_attribute(
        &self,
        space_id: u64,
        updates: &[AttributeUpdate],
    ) -> Result<()> {
        let operation = "update_vector_attribute";
        let form = encode::update_attributes_form(operation, space_id, updates)?;
        self.post_form(operation, UPDATE_ATTRIBUTES_PATH, form).await?;
        Ok(())
    }

    /// Items that relate to `query` the way each pair's `end` relates to its `start`.
    #[instrument(skip_all, fields(space_id = space_id, pairs = pairs.len(), top_k = top_k))]
    pub async fn compute_analogy(
        &self,
        space_id: u64,
        query: Content,
        pairs: Vec<AnalogyPair>,
        top_k: u32,
    ) -> Result<Vec<AnalogyResult>> {
        let operation = "compute_analogy";
        let form = encode::analogy_form(operation, space_id, query, pairs, top_k).await?;
        let value = self.post_form(operation, ANALOGY_PATH, form).await?;
        decode::lookup_results(operation, value)
    }

    #[instrument(skip_all, fields(space_id = space_id, batch = ids.len()))]
    pub async fn delete_vector_embeddings(&self, space_id: u64, ids: &[u64]) -> Result<()> {
        let operation = "delete_vector_embeddings";
        let form = encode::delete_form(operation, space_id, ids)?;
        self.post_form(operation, DELETE_PATH, form).await?;
        Ok(())
    }

    /// Deletes every entry of the space. The space itself remains.
    #[instrument(skip_all, fields(space_id = space_id))]
    pub async fn delete_vector_space_entries(&self, space_id: u64) -> Result<()> {
        let form = encode::delete_all_form(space_id);
        self.post_form("delete_vector_space_entries", DELETE_ALL_PATH, form)
            .await?;
        Ok(())
    }
}
