use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::{
    api::{AnalogyPair, AnalogyResult, IngestResponse, LookupResult, Modality, Model, ModelInfo},
    client::Vecto,
    encode,
    error::{Result, VectoError},
    source::{Content, ImageSource},
};

/// Where a [`VectorSpace`] handle stands with respect to its remote id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceState {
    /// Only the name is known.
    Unresolved,
    /// The id is known and cached for the lifetime of the handle.
    Resolved { id: u64, model: Option<ModelInfo> },
}

/// A named vector space. The id is looked up by name on the first operation
/// that needs it and reused afterwards.
#[derive(Debug)]
pub struct VectorSpace {
    client: Vecto,
    name: String,
    state: Mutex<SpaceState>,
}

impl VectorSpace {
    pub fn new(client: Vecto, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
            state: Mutex::new(SpaceState::Unresolved),
        }
    }

    /// A handle whose id is already known; no name lookup will be issued.
    pub fn with_id(client: Vecto, name: impl Into<String>, id: u64) -> Self {
        Self {
            client,
            name: name.into(),
            state: Mutex::new(SpaceState::Resolved { id, model: None }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Vecto {
        &self.client
    }

    pub async fn state(&self) -> SpaceState {
        self.state.lock().await.clone()
    }

    /// The cached id, without triggering resolution.
    pub async fn id(&self) -> Option<u64> {
        match &*self.state.lock().await {
            SpaceState::Resolved { id, .. } => Some(*id),
            SpaceState::Unresolved => None,
        }
    }

    pub async fn model(&self) -> Option<ModelInfo> {
        match &*self.state.lock().await {
            SpaceState::Resolved { model, .. } => model.clone(),
            SpaceState::Unresolved => None,
        }
    }

    /// Returns the space id, looking it up by name if not yet known.
    ///
    /// The lock is held across the lookup so concurrent callers share a
    /// single resolution request.
    async fn resolve(&self, operation: &'static str) -> Result<u64> {
        let mut state = self.state.lock().await;
        if let SpaceState::Resolved { id, .. } = &*state {
            return Ok(*id);
        }

        let space = self
            .client
            .get_vector_space_by_name(&self.name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VectoError::NotFound {
                operation,
                resource: format!("vector space `{}`", self.name),
            })?;

        info!(name = %self.name, id = space.id, "resolved vector space");
        let id = space.id;
        *state = SpaceState::Resolved {
            id,
            model: Some(space.model),
        };
        Ok(id)
    }

    /// Whether a space with this name exists. A miss leaves the handle unresolved.
    pub async fn exists(&self) -> Result<bool> {
        match self.resolve("exists").await {
            Ok(_) => Ok(true),
            Err(VectoError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Creates the space and records its id. On an already resolved handle
    /// this is a no-op returning the known id.
    ///
    /// Space names are not unique on the service, so call [`Self::exists`]
    /// first when the space may already be there.
    #[instrument(skip(self), fields(name = %self.name))]
    pub async fn create(&self, model: Model, modality: Modality) -> Result<u64> {
        let mut state = self.state.lock().await;
        if let SpaceState::Resolved { id, .. } = &*state {
            info!(id, "vector space already exists");
            return Ok(*id);
        }
        if !model.supports(modality) {
            return Err(VectoError::validation(
                "create",
                format!("model {} cannot embed {modality}", model.name()),
            ));
        }

        let created = self.client.create_vector_space(&self.name, model).await?;
        info!(id = created.id, "created vector space");
        let id = created.id;
        *state = SpaceState::Resolved {
            id,
            model: Some(created.model),
        };
        Ok(id)
    }

    /// Deletes the space on the service and returns the handle to unresolved.
    pub async fn delete(&self) -> Result<()> {
        let id = self.resolve("delete").await?;
        self.client.delete_vector_space(id).await?;
        *self.state.lock().await = SpaceState::Unresolved;
        Ok(())
    }

    pub async fn ingest_text(
        &self,
        text: impl Into<String>,
        attributes: Value,
    ) -> Result<IngestResponse> {
        self.ingest_text_batch(vec![text.into()], vec![attributes])
            .await
    }

    pub async fn ingest_text_batch(
        &self,
        texts: Vec<String>,
        attributes: Vec<Value>,
    ) -> Result<IngestResponse> {
        let contents = texts.into_iter().map(Content::Text).collect();
        let items = encode::pair_items("ingest_text", contents, attributes)?;
        let id = self.resolve("ingest_text").await?;
        self.client.ingest_as("ingest_text", id, items).await
    }

    pub async fn ingest_image(
        &self,
        image: impl Into<ImageSource>,
        attributes: Value,
    ) -> Result<IngestResponse> {
        self.ingest_image_batch(vec![image.into()], vec![attributes])
            .await
    }

    pub async fn ingest_image_batch(
        &self,
        images: Vec<ImageSource>,
        attributes: Vec<Value>,
    ) -> Result<IngestResponse> {
        let contents = images.into_iter().map(Content::Image).collect();
        let items = encode::pair_items("ingest_image", contents, attributes)?;
        let id = self.resolve("ingest_image").await?;
        self.client.ingest_as("ingest_image", id, items).await
    }

    pub async fn lookup_text(&self, query: &str, top_k: u32) -> Result<Vec<LookupResult>> {
        encode::check_top_k("lookup_text", top_k)?;
        let id = self.resolve("lookup_text").await?;
        self.client.lookup_text(id, query, top_k).await
    }

    pub async fn lookup_image(
        &self,
        query: impl Into<ImageSource>,
        top_k: u32,
    ) -> Result<Vec<LookupResult>> {
        encode::check_top_k("lookup_image", top_k)?;
        let id = self.resolve("lookup_image").await?;
        self.client.lookup_image(id, query.into(), top_k).await
    }

    /// e.g. query "king" with pair ("man", "woman") looks for "queen".
    pub async fn compute_text_analogy(
        &self,
        query: &str,
        pair: AnalogyPair,
        top_k: u32,
    ) -> Result<Vec<AnalogyResult>> {
        encode::check_top_k("compute_text_analogy", top_k)?;
        encode::check_analogy(
            "compute_text_analogy",
            Modality::Text,
            std::slice::from_ref(&pair),
        )?;
        let id = self.resolve("compute_text_analogy").await?;
        self.client
            .compute_analogy(id, Content::from(query), vec![pair], top_k)
            .await
    }

    pub async fn compute_image_analogy(
        &self,
        query: impl Into<ImageSource>,
        pair: AnalogyPair,
        top_k: u32,
    ) -> Result<Vec<AnalogyResult>> {
        encode::check_top_k("compute_image_analogy", top_k)?;
        encode::check_analogy(
            "compute_image_analogy",
            Modality::Image,
            std::slice::from_ref(&pair),
        )?;
        let id = self.resolve("compute_image_analogy").await?;
        self.client
            .compute_analogy(id, Content::Image(query.into()), vec![pair], top_k)
            .await
    }

    pub async fn delete_entries(&self, ids: &[u64]) -> Result<()> {
        encode::check_ids("delete_entries", ids)?;
        let id = self.resolve("delete_entries").await?;
        self.client.delete_vector_embeddings(id, ids).await
    }

    /// Removes every entry but keeps the space.
    pub async fn clear_entries(&self) -> Result<()> {
        let id = self.resolve("clear_entries").await?;
        self.client.delete_vector_space_entries(id).await
    }
}
