//! Saving a generated image under a name derived from its prompt.

use crate::{
    error::Result,
    storage::{ImageStorage, SavedImage},
    studio::image_client::{FetchedImage, ImageClient},
};

pub const FILENAME_PREFIX: &str = "AI_";
/// Length of the prompt prefix kept in filenames, in UTF-16 code units.
pub const PROMPT_PREFIX_UNITS: usize = 30;

fn keeps(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// First 30 UTF-16 code units of the prompt, with every character other
/// than ASCII letters, digits and CJK ideographs turned into `_` and runs
/// of `_` collapsed to one.
///
/// A character outside the BMP counts as two units. One cut in half by the
/// limit still contributes a `_`.
pub fn sanitize_prompt(prompt: &str) -> String {
    let mut clean = String::new();
    let mut units = 0;
    for c in prompt.chars() {
        if units >= PROMPT_PREFIX_UNITS {
            break;
        }
        units += c.len_utf16();
        let c = if keeps(c) { c } else { '_' };
        if c == '_' && clean.ends_with('_') {
            continue;
        }
        clean.push(c);
    }
    clean
}

pub fn derive_filename(prompt: &str, timestamp_ms: i64, extension: &str) -> String {
    format!(
        "{}{}_{}.{}",
        FILENAME_PREFIX,
        sanitize_prompt(prompt),
        timestamp_ms,
        extension
    )
}

/// Stores an image that has already been fetched.
pub async fn save_image(
    storage: &dyn ImageStorage,
    image: &FetchedImage,
    prompt: &str,
    now_ms: i64,
) -> Result<SavedImage> {
    let filename = derive_filename(
        prompt,
        now_ms,
        extension_for(image.content_type.as_deref()),
    );
    if storage.exists(&filename).await? {
        log::warn!("⚠️  {} already exists, overwriting", filename);
    }
    let saved = storage.save(&filename, &image.bytes).await?;
    log::info!(
        "💾 Saved {} ({} bytes) to {}",
        saved.filename,
        saved.bytes_written,
        storage.describe()
    );
    Ok(saved)
}

/// Fetches `url` and stores it. Nothing is written unless the fetch
/// succeeds in full.
pub async fn download_image(
    client: &ImageClient,
    storage: &dyn ImageStorage,
    url: &str,
    prompt: &str,
    now_ms: i64,
) -> Result<SavedImage> {
    let image = client.fetch(url).await.map_err(|e| {
        log::error!("❌ Download failed: {}", e);
        e
    })?;
    save_image(storage, &image, prompt, now_ms).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;
    use crate::storage::MemoryImageStorage;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn sanitize_collapses_separators() {
        assert_eq!(sanitize_prompt("a cute  cat!!"), "a_cute_cat_");
        assert_eq!(sanitize_prompt("一只可爱的猫咪，在阳光下"), "一只可爱的猫咪_在阳光下");
        assert_eq!(sanitize_prompt("__x__"), "_x_");
        assert_eq!(sanitize_prompt(""), "");
    }

    #[test]
    fn sanitize_takes_thirty_characters_before_collapsing() {
        let prompt = format!("{}{}", "a".repeat(29), "bcdef");
        assert_eq!(sanitize_prompt(&prompt), format!("{}b", "a".repeat(29)));

        // Ten spaces then text: the spaces use up prefix characters.
        let prompt = format!("{}{}", " ".repeat(10), "x".repeat(40));
        assert_eq!(sanitize_prompt(&prompt), format!("_{}", "x".repeat(20)));
    }

    #[test]
    fn sanitize_counts_utf16_units() {
        // The emoji takes units 29 and 30, so the trailing `b` is cut.
        let prompt = format!("{}😀b", "a".repeat(28));
        assert_eq!(sanitize_prompt(&prompt), format!("{}_", "a".repeat(28)));

        // Only the first half of the emoji fits.
        let prompt = format!("{}😀b", "a".repeat(29));
        assert_eq!(sanitize_prompt(&prompt), format!("{}_", "a".repeat(29)));

        assert_eq!(sanitize_prompt(&"😀".repeat(20)), "_");
    }

    #[tokio::test]
    async fn save_image_uses_content_type_for_extension() {
        let storage = MemoryImageStorage::new();
        let image = FetchedImage {
            bytes: b"webp-bytes".to_vec(),
            content_type: Some("image/webp".into()),
        };
        let saved = save_image(&storage, &image, "a cat", 7).await.unwrap();
        assert_eq!(saved.filename, "AI_a_cat_7.webp");
        assert_eq!(storage.get("AI_a_cat_7.webp").await.unwrap(), b"webp-bytes");
    }

    #[test]
    fn filename_layout() {
        assert_eq!(
            derive_filename("sunset over lake", 1700000000000, "png"),
            "AI_sunset_over_lake_1700000000000.png"
        );
        assert_eq!(extension_for(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for(Some("image/webp; charset=binary")), "webp");
        assert_eq!(extension_for(Some("application/octet-stream")), "png");
        assert_eq!(extension_for(None), "png");
    }

    #[tokio::test]
    async fn download_saves_fetched_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/prompt/cat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(b"jpeg-bytes".to_vec()),
            )
            .mount(&server)
            .await;

        let client = ImageClient::new(None).unwrap();
        let storage = MemoryImageStorage::new();
        let saved = download_image(
            &client,
            &storage,
            &format!("{}/prompt/cat", server.uri()),
            "cat",
            42,
        )
        .await
        .unwrap();

        assert_eq!(saved.filename, "AI_cat_42.jpg");
        assert_eq!(storage.get("AI_cat_42.jpg").await.unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn failed_download_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = ImageClient::new(None).unwrap();
        let storage = MemoryImageStorage::new();
        let err = download_image(
            &client,
            &storage,
            &format!("{}/prompt/cat", server.uri()),
            "cat",
            42,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StudioError::ResponseError { status: 404, .. }));
        assert!(storage.is_empty().await);
    }
}
