//! Request encoders.
//!
//! Every check here runs before anything is sent, so a rejected batch is
//! never partially submitted.

use serde_json::{json, Value};

use crate::{
    api::{AnalogyPair, AttributeUpdate, EmbeddingUpdate, IngestItem, Modality, Model},
    error::{Result, VectoError},
    source::{load_all, Content},
    transport::{MultipartForm, BINARY_MIME, TEXT_MIME},
};

fn mime_for(modality: Modality) -> &'static str {
    match modality {
        Modality::Text => TEXT_MIME,
        Modality::Image => BINARY_MIME,
    }
}

fn attributes_field(operation: &'static str, attributes: &Value) -> Result<String> {
    serde_json::to_string(attributes)
        .map_err(|e| VectoError::validation(operation, format!("unserializable attributes: {e}")))
}

pub(crate) fn check_top_k(operation: &'static str, top_k: u32) -> Result<()> {
    if top_k == 0 {
        return Err(VectoError::validation(operation, "top_k must be at least 1"));
    }
    Ok(())
}

pub(crate) fn check_ids(operation: &'static str, ids: &[u64]) -> Result<()> {
    if ids.is_empty() {
        return Err(VectoError::validation(operation, "no vector ids given"));
    }
    Ok(())
}

/// Returns the single modality shared by `contents`.
fn common_modality<'a>(
    operation: &'static str,
    mut contents: impl Iterator<Item = &'a Content>,
) -> Result<Modality> {
    let first = contents
        .next()
        .ok_or_else(|| VectoError::validation(operation, "batch is empty"))?
        .modality();
    for (index, content) in contents.enumerate() {
        if content.modality() != first {
            return Err(VectoError::validation(
                operation,
                format!(
                    "item {} is {} but the batch is {first}",
                    index + 1,
                    content.modality()
                ),
            ));
        }
    }
    Ok(first)
}

/// Pairs contents with attributes position by position. The lengths must
/// agree and the batch must not be empty.
pub(crate) fn pair_items(
    operation: &'static str,
    contents: Vec<Content>,
    attributes: Vec<Value>,
) -> Result<Vec<IngestItem>> {
    if contents.is_empty() {
        return Err(VectoError::validation(operation, "batch is empty"));
    }
    if contents.len() != attributes.len() {
        return Err(VectoError::validation(
            operation,
            format!(
                "{} items but {} attribute mappings",
                contents.len(),
                attributes.len()
            ),
        ));
    }
    Ok(contents
        .into_iter()
        .zip(attributes)
        .map(|(content, attributes)| IngestItem {
            content,
            attributes,
        })
        .collect())
}

pub(crate) async fn ingest_form(
    operation: &'static str,
    space_id: u64,
    items: Vec<IngestItem>,
) -> Result<MultipartForm> {
    let modality = common_modality(operation, items.iter().map(|i| &i.content))?;

    let (contents, attributes): (Vec<_>, Vec<_>) =
        items.into_iter().map(|i| (i.content, i.attributes)).unzip();
    let attributes = attributes
        .iter()
        .map(|a| attributes_field(operation, a))
        .collect::<Result<Vec<_>>>()?;
    let data = load_all(contents).await?;

    let mut form = MultipartForm::new()
        .text("vector_space_id", space_id.to_string())
        .text("modality", modality.as_str());
    for (bytes, attributes) in data.into_iter().zip(attributes) {
        form = form
            .text("attributes", attributes)
            .file("input", bytes, mime_for(modality));
    }
    Ok(form)
}

pub(crate) async fn lookup_form(
    operation: &'static str,
    space_id: u64,
    query: Content,
    top_k: u32,
    ids: Option<&[u64]>,
) -> Result<MultipartForm> {
    check_top_k(operation, top_k)?;
    let modality = query.modality();

    let mut form = MultipartForm::new()
        .text("vector_space_id", space_id.to_string())
        .text("modality", modality.as_str())
        .text("top_k", top_k.to_string());
    for id in ids.unwrap_or_default() {
        form = form.text("ids", id.to_string());
    }
    Ok(form.file("query", query.load().await?, mime_for(modality)))
}

pub(crate) async fn update_vectors_form(
    operation: &'static str,
    space_id: u64,
    updates: Vec<EmbeddingUpdate>,
) -> Result<MultipartForm> {
    let modality = common_modality(operation, updates.iter().map(|u| &u.content))?;

    let (ids, contents): (Vec<_>, Vec<_>) =
        updates.into_iter().map(|u| (u.id, u.content)).unzip();
    let data = load_all(contents).await?;

    let mut form = MultipartForm::new()
        .text("vector_space_id", space_id.to_string())
        .text("modality", modality.as_str());
    for (id, bytes) in ids.into_iter().zip(data) {
        form = form
            .text("id", id.to_string())
            .file("input", bytes, mime_for(modality));
    }
    Ok(form)
}

pub(crate) fn update_attributes_form(
    operation: &'static str,
    space_id: u64,
    updates: &[AttributeUpdate],
) -> Result<MultipartForm> {
    if updates.is_empty() {
        return Err(VectoError::validation(operation, "batch is empty"));
    }
    let mut form = MultipartForm::new().text("vector_space_id", space_id.to_string());
    for update in updates {
        form = form
            .text("id", update.id.to_string())
            .text("attributes", attributes_field(operation, &update.attributes)?);
    }
    Ok(form)
}

/// An analogy needs at least one pair, and every side of every pair must
/// share the query's modality.
pub(crate) fn check_analogy(
    operation: &'static str,
    modality: Modality,
    pairs: &[AnalogyPair],
) -> Result<()> {
    if pairs.is_empty() {
        return Err(VectoError::validation(
            operation,
            "an analogy needs at least one start/end pair",
        ));
    }
    for pair in pairs {
        for content in [&pair.start, &pair.end] {
            if content.modality() != modality {
                return Err(VectoError::validation(
                    operation,
                    format!(
                        "analogy pair is {} but the query is {modality}",
                        content.modality()
                    ),
                ));
            }
        }
    }
    Ok(())
}

pub(crate) async fn analogy_form(
    operation: &'static str,
    space_id: u64,
    query: Content,
    pairs: Vec<AnalogyPair>,
    top_k: u32,
) -> Result<MultipartForm> {
    check_top_k(operation, top_k)?;
    let modality = query.modality();
    check_analogy(operation, modality, &pairs)?;

    let mut contents = Vec::with_capacity(1 + pairs.len() * 2);
    contents.push(query);
    for pair in pairs {
        contents.push(pair.start);
        contents.push(pair.end);
    }
    let mut data = load_all(contents).await?.into_iter();
    let mime = mime_for(modality);

    let mut form = MultipartForm::new()
        .text("vector_space_id", space_id.to_string())
        .text("modality", modality.as_str())
        .text("top_k", top_k.to_string());
    if let Some(query) = data.next() {
        form = form.file("query", query, mime);
    }
    while let (Some(start), Some(end)) = (data.next(), data.next()) {
        form = form.file("from", start, mime).file("to", end, mime);
    }
    Ok(form)
}

pub(crate) fn delete_form(
    operation: &'static str,
    space_id: u64,
    ids: &[u64],
) -> Result<MultipartForm> {
    check_ids(operation, ids)?;
    let mut form = MultipartForm::new().text("vector_space_id", space_id.to_string());
    for id in ids {
        form = form.text("id", id.to_string());
    }
    Ok(form)
}

pub(crate) fn delete_all_form(space_id: u64) -> MultipartForm {
    MultipartForm::new().text("vector_space_id", space_id.to_string())
}

fn check_name(operation: &'static str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(VectoError::validation(operation, "name must not be empty"));
    }
    Ok(())
}

pub(crate) fn create_space_body(operation: &'static str, name: &str, model: Model) -> Result<Value> {
    check_name(operation, name)?;
    Ok(json!({ "name": name, "modelId": model.id() }))
}

pub(crate) fn rename_space_body(operation: &'static str, name: &str) -> Result<Value> {
    check_name(operation, name)?;
    Ok(json!({ "name": name }))
}

pub(crate) fn create_token_body(
    operation: &'static str,
    name: &str,
    token_type: &str,
    vector_space_ids: &[u64],
    all_vector_spaces: bool,
) -> Result<Value> {
    check_name(operation, name)?;
    Ok(json!({
        "name": name,
        "tokenType": token_type,
        "vectorSpaceIds": vector_space_ids,
        "allowsAccessToAllVectorSpaces": all_vector_spaces,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::source::ImageSource;

    fn texts(words: &[&str]) -> Vec<Content> {
        words.iter().map(|w| Content::from(*w)).collect()
    }

    #[test]
    fn misaligned_attributes_are_rejected() {
        let err = pair_items(
            "ingest_text",
            texts(&["lion", "tiger"]),
            vec![json!({"text": "lion"})],
        )
        .unwrap_err();
        match err {
            VectoError::Validation { operation, message } => {
                assert_eq!(operation, "ingest_text");
                assert!(message.contains("2 items but 1 attribute"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_pairing_is_rejected() {
        let err = pair_items("ingest_text", vec![], vec![]).unwrap_err();
        assert!(matches!(err, VectoError::Validation { .. }));
    }

    #[test]
    fn analogy_check_runs_without_loading_content() {
        let pairs = [AnalogyPair::new("man", "woman")];
        assert!(check_analogy("compute_text_analogy", Modality::Text, &pairs).is_ok());
        let err = check_analogy("compute_image_analogy", Modality::Image, &pairs).unwrap_err();
        assert!(matches!(
            err,
            VectoError::Validation { operation: "compute_image_analogy", .. }
        ));
    }

    #[tokio::test]
    async fn ingest_form_pairs_attributes_with_inputs() {
        let items = pair_items(
            "ingest_text",
            texts(&["lion", "tiger"]),
            vec![json!({"text": "lion"}), json!({"text": "tiger"})],
        )
        .unwrap();
        let form = ingest_form("ingest_text", 7, items).await.unwrap();

        assert_eq!(form.texts("vector_space_id"), vec!["7"]);
        assert_eq!(form.texts("modality"), vec!["TEXT"]);
        assert_eq!(
            form.texts("attributes"),
            vec![r#"{"text":"lion"}"#, r#"{"text":"tiger"}"#]
        );
        assert_eq!(form.files("input"), vec![b"lion".as_slice(), b"tiger".as_slice()]);
    }

    #[tokio::test]
    async fn mixed_modality_batch_is_rejected() {
        let items = vec![
            IngestItem::text("lion", json!(null)),
            IngestItem::image(ImageSource::Bytes(vec![0]), json!(null)),
        ];
        let err = ingest_form("ingest", 1, items).await.unwrap_err();
        assert!(matches!(err, VectoError::Validation { .. }));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let err = ingest_form("ingest", 1, vec![]).await.unwrap_err();
        assert!(matches!(err, VectoError::Validation { .. }));
    }

    #[tokio::test]
    async fn lookup_form_repeats_ids_and_sends_query_file() {
        let form = lookup_form("lookup", 3, Content::from("blue"), 5, Some(&[4, 9][..]))
            .await
            .unwrap();
        assert_eq!(form.texts("top_k"), vec!["5"]);
        assert_eq!(form.texts("ids"), vec!["4", "9"]);
        assert_eq!(form.files("query"), vec![b"blue".as_slice()]);
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let err = lookup_form("lookup", 3, Content::from("blue"), 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, VectoError::Validation { .. }));
    }

    #[tokio::test]
    async fn analogy_form_orders_pairs() {
        let pairs = vec![
            AnalogyPair::new("man", "woman"),
            AnalogyPair::new("boy", "girl"),
        ];
        let form = analogy_form("compute_analogy", 2, Content::from("king"), pairs, 1)
            .await
            .unwrap();
        assert_eq!(form.files("query"), vec![b"king".as_slice()]);
        assert_eq!(form.files("from"), vec![b"man".as_slice(), b"boy".as_slice()]);
        assert_eq!(form.files("to"), vec![b"woman".as_slice(), b"girl".as_slice()]);
    }

    #[tokio::test]
    async fn analogy_without_pairs_is_rejected() {
        let err = analogy_form("compute_analogy", 2, Content::from("king"), vec![], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, VectoError::Validation { .. }));
    }

    #[tokio::test]
    async fn analogy_pair_must_match_query_modality() {
        let pairs = vec![AnalogyPair::new(
            ImageSource::Bytes(vec![1]),
            ImageSource::Bytes(vec![2]),
        )];
        let err = analogy_form("compute_analogy", 2, Content::from("king"), pairs, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, VectoError::Validation { .. }));
    }

    #[tokio::test]
    async fn update_vectors_form_interleaves_ids() {
        let updates = vec![
            EmbeddingUpdate { id: 10, content: Content::from("red") },
            EmbeddingUpdate { id: 11, content: Content::from("green") },
        ];
        let form = update_vectors_form("update_vector_embeddings", 1, updates)
            .await
            .unwrap();
        let names: Vec<_> = form.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["vector_space_id", "modality", "id", "input", "id", "input"]
        );
    }

    #[test]
    fn update_attributes_form_encodes_json() {
        let form = update_attributes_form(
            "update_vector_attribute",
            1,
            &[AttributeUpdate { id: 3, attributes: json!("new_attribute") }],
        )
        .unwrap();
        assert_eq!(form.texts("id"), vec!["3"]);
        assert_eq!(form.texts("attributes"), vec![r#""new_attribute""#]);
    }

    #[test]
    fn delete_requires_ids() {
        assert!(delete_form("delete_vector_embeddings", 1, &[]).is_err());
        let form = delete_form("delete_vector_embeddings", 1, &[5, 6]).unwrap();
        assert_eq!(form.texts("id"), vec!["5", "6"]);
    }

    #[test]
    fn create_space_body_uses_model_id() {
        let body = create_space_body("create_vector_space", "birds", Model::Sbert).unwrap();
        assert_eq!(body, json!({"name": "birds", "modelId": 2}));
        assert!(create_space_body("create_vector_space", "  ", Model::Clip).is_err());
    }
}
