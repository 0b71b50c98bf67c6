//! Final prompt text and the outbound request URL.

use crate::{
    config::ImageEndpoint,
    error::Result,
    models::{GenerationParameters, ImageSize, Style},
};
use url::Url;

/// Fullwidth comma between the user's text and the style suffix.
pub const STYLE_SEPARATOR: &str = "，";

pub fn compose_prompt(user_text: &str, style: Style) -> String {
    format!("{}{}{}", user_text, STYLE_SEPARATOR, style.suffix())
}

/// Like [`compose_prompt`] but takes a raw style key; unknown keys use the
/// default style.
pub fn compose_prompt_for_key(user_text: &str, style_key: &str) -> String {
    compose_prompt(user_text, Style::from_key_or_default(style_key))
}

/// `<base>/prompt/<encoded prompt>?width=..&height=..&model=..&nologo=..&seed=..&steps=..&cfg_scale=..&sampler=..`
///
/// The prompt becomes a single path segment; the query is form-encoded in a
/// fixed key order so identical inputs always give identical URLs.
pub fn build_request_url(
    prompt: &str,
    size: &ImageSize,
    params: &GenerationParameters,
    endpoint: &ImageEndpoint,
) -> Result<Url> {
    let raw = format!("{}{}", endpoint.prompt_root(), urlencoding::encode(prompt));
    let mut url = Url::parse(&raw)?;

    url.query_pairs_mut()
        .append_pair("width", &size.width.to_string())
        .append_pair("height", &size.height.to_string())
        .append_pair("model", &endpoint.model)
        .append_pair("nologo", if endpoint.nologo { "true" } else { "false" })
        .append_pair("seed", &params.seed.to_string())
        .append_pair("steps", &params.steps.to_string())
        .append_pair("cfg_scale", &params.cfg_scale.to_string())
        .append_pair("sampler", params.sampler.as_str());

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sampler;
    use crate::state::resolver;
    use std::collections::HashMap;

    const ANIME_CAT_SEGMENT: &str = "cat%EF%BC%8C%E5%8A%A8%E6%BC%AB%E9%A3%8E%E6%A0%BC%EF%BC%8C%E4%BA%8C%E6%AC%A1%E5%85%83%E6%8F%92%E7%94%BB%E6%95%88%E6%9E%9C";

    #[test]
    fn compose_appends_style_suffix() {
        assert_eq!(
            compose_prompt("cat", Style::Anime),
            "cat，动漫风格，二次元插画效果"
        );
        assert_eq!(
            compose_prompt("cat", Style::Anime),
            compose_prompt("cat", Style::Anime)
        );
        assert_eq!(
            compose_prompt_for_key("cat", "unknown"),
            "cat，写实风格，真实照片效果"
        );
    }

    #[test]
    fn builds_the_exact_default_url() {
        let prompt = compose_prompt("cat", Style::Anime);
        let url = build_request_url(
            &prompt,
            &ImageSize::default(),
            &GenerationParameters::default(),
            &ImageEndpoint::default(),
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            format!(
                "https://image.pollinations.ai/prompt/{}?width=1024&height=1024&model=flux&nologo=true&seed=100&steps=30&cfg_scale=7.5&sampler=euler_a",
                ANIME_CAT_SEGMENT
            )
        );
    }

    #[test]
    fn reserved_characters_stay_inside_one_segment() {
        let url = build_request_url(
            "a cat/dog? #1 & more",
            &ImageSize::default(),
            &GenerationParameters::default(),
            &ImageEndpoint::default(),
        )
        .unwrap();

        assert_eq!(
            url.path(),
            "/prompt/a%20cat%2Fdog%3F%20%231%20%26%20more"
        );
        assert_eq!(url.path_segments().unwrap().count(), 2);
        assert!(url.fragment().is_none());
    }

    #[test]
    fn query_reflects_current_values() {
        let size = resolver::set_width(&resolver::select_ratio("16:9"), 768);
        let params = GenerationParameters::new()
            .with_seed(7)
            .with_steps(50)
            .with_cfg_scale(12.5)
            .unwrap()
            .with_sampler(Sampler::Dpm2Ancestral);
        let endpoint = ImageEndpoint::new()
            .with_base_url("http://localhost:9000/")
            .with_model("turbo")
            .with_nologo(false);

        let url = build_request_url("cat", &size, &params, &endpoint).unwrap();
        assert!(url.as_str().starts_with("http://localhost:9000/prompt/cat?"));

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 8);
        assert_eq!(query["width"], "768");
        assert_eq!(query["height"], "432");
        assert_eq!(query["model"], "turbo");
        assert_eq!(query["nologo"], "false");
        assert_eq!(query["seed"], "7");
        assert_eq!(query["steps"], "50");
        assert_eq!(query["cfg_scale"], "12.5");
        assert_eq!(query["sampler"], "dpm2_a");
    }
}
