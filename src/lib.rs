//! A typed client for the Vecto vector database API.
//!
//! [`Vecto`] exposes one method per remote operation. [`VectorSpace`] wraps
//! it around a single named space whose id is resolved on first use.

pub mod api;
pub mod client;
pub mod config;
mod decode;
mod encode;
pub mod error;
mod management;
pub mod source;
pub mod transport;
pub mod vector_space;

pub use api::{
    AnalogyPair, AnalogyResult, AttributeUpdate, EmbeddingUpdate, IngestItem, IngestResponse,
    LookupResult, Modality, Model, ModelInfo, VectorSpaceInfo,
};
pub use client::Vecto;
pub use config::{default_config, set_default_config, Config, TokenKind};
pub use error::{Result, VectoError};
pub use source::{Content, ImageSource};
pub use vector_space::{SpaceState, VectorSpace};
