//! Article body retrieval.

use std::time::Duration;

use regex::Regex;

use crate::collector::clean_text;
use crate::error::IngestError;
use crate::retry::retry_with_backoff;
use crate::types::IngestConfig;

/// Capability seam for retrieving an article's body text.
pub trait FetchArticle {
    /// Fetch the article at `url` and return its plain-text body.
    ///
    /// `Ok(None)` means the page was served but carried no recognizable
    /// article body; `Err` means the page could not be fetched at all.
    async fn fetch_article(&self, url: &str) -> Result<Option<String>, IngestError>;
}

/// HTTP article fetcher for the news site's article markup.
pub struct ArticleFetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ArticleFetcher {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the client cannot be constructed.
    pub fn new(config: &IngestConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, IngestError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}

impl FetchArticle for ArticleFetcher {
    async fn fetch_article(&self, url: &str) -> Result<Option<String>, IngestError> {
        let html = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.fetch_html(url)
        })
        .await?;
        Ok(extract_body_text(&html))
    }
}

/// Pull the article body out of the page markup.
///
/// The site wraps the story in a `div` whose class contains
/// `articlebodycontent`; the text lives in its `<p>` children. Returns `None`
/// when the container is missing or yields no text.
pub fn extract_body_text(html: &str) -> Option<String> {
    let container_re = Regex::new(
        r#"(?is)<div[^>]*class\s*=\s*["'][^"']*articlebodycontent[^"']*["'][^>]*>(.*)</div>"#,
    )
    .expect("valid container regex");
    let p_re = Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid paragraph regex");

    let container = container_re.captures(html)?;
    let block = container.get(1).map_or("", |m| m.as_str());

    let paragraphs: Vec<String> = p_re
        .captures_iter(block)
        .map(|cap| clean_text(cap.get(1).map_or("", |m| m.as_str())))
        .filter(|text| !text.is_empty())
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE_FIXTURE: &str = r#"
        <html><body>
        <div class="articlebodycontent col-xl-9">
          <p>Two soldiers were <b>injured</b> in an exchange of fire.</p>
          <p>  The operation   continued into the night. </p>
          <p></p>
        </div>
        </body></html>
    "#;

    fn test_config(timeout: u64) -> IngestConfig {
        IngestConfig {
            news_index_url: String::new(),
            index_pages: 1,
            request_timeout_secs: timeout,
            user_agent: "sitrep-test/0.1".to_string(),
            max_retries: 0,
            retry_backoff_base_ms: 0,
            classifier_url: String::new(),
            classifier_api_token: None,
            llm_base_url: String::new(),
            llm_api_key: None,
            llm_model: String::new(),
            llm_fallback_models: vec![],
            geocoder_url: String::new(),
            weather_url: String::new(),
        }
    }

    #[test]
    fn extract_body_text_joins_cleaned_paragraphs() {
        let body = extract_body_text(ARTICLE_FIXTURE).expect("body");
        assert_eq!(
            body,
            "Two soldiers were injured in an exchange of fire. The operation continued into the night."
        );
    }

    #[test]
    fn extract_body_text_is_none_without_container() {
        let html = "<html><body><p>Unrelated page.</p></body></html>";
        assert!(extract_body_text(html).is_none());
    }

    #[test]
    fn extract_body_text_is_none_when_container_is_empty() {
        let html = r#"<div class="articlebodycontent"><p>   </p></div>"#;
        assert!(extract_body_text(html).is_none());
    }

    #[tokio::test]
    async fn fetch_article_returns_none_for_bodyless_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story.ece"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let fetcher = ArticleFetcher::new(&test_config(5)).expect("fetcher");
        let result = fetcher
            .fetch_article(&format!("{}/story.ece", server.uri()))
            .await
            .expect("fetch");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fetch_article_errors_on_server_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = ArticleFetcher::new(&test_config(5)).expect("fetcher");
        let result = fetcher
            .fetch_article(&format!("{}/story.ece", server.uri()))
            .await;
        assert!(matches!(
            result,
            Err(IngestError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn fetch_article_extracts_body_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story.ece"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_FIXTURE))
            .mount(&server)
            .await;

        let fetcher = ArticleFetcher::new(&test_config(5)).expect("fetcher");
        let body = fetcher
            .fetch_article(&format!("{}/story.ece", server.uri()))
            .await
            .expect("fetch")
            .expect("body");
        assert!(body.starts_with("Two soldiers"));
    }
}
