use crate::client::{FetchOptions, VastClient};
use crate::config::PluginConfig;
use crate::error::{AdError, Result};
use crate::models::AdResponse;
use log::debug;

/// Resolve the configured ad source into a parsed response.
///
/// Exactly one of `url` and `xml` must be set. The remote path delegates to
/// the client, which owns wrapper redirection up to `wrapper_limit`; the
/// inline path parses the document without touching the network. No retries
/// happen here.
pub async fn fetch_response<C: VastClient>(
    client: &C,
    config: &PluginConfig,
) -> Result<AdResponse> {
    match (config.url.as_deref(), config.xml.as_deref()) {
        (Some(_), Some(_)) => Err(AdError::Configuration(
            "url and xml options are mutually exclusive".to_string(),
        )),
        (Some(url), None) => {
            debug!("requesting ad tag from {url}");
            let options = FetchOptions {
                with_credentials: config.with_credentials,
                wrapper_limit: config.wrapper_limit,
            };
            client.get(url, &options).await
        }
        (None, Some(xml)) => {
            debug!("parsing inline ad document ({} bytes)", xml.len());
            client.parse_document(xml).map_err(|e| {
                AdError::Configuration(format!("xml option is not a valid VAST document: {e}"))
            })
        }
        (None, None) => Err(AdError::Configuration(
            "url or xml option not set".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpVastClient;

    #[tokio::test]
    async fn rejects_missing_source() {
        let client = HttpVastClient::new().unwrap();
        let config = PluginConfig::default();

        let err = fetch_response(&client, &config).await.unwrap_err();
        assert!(matches!(err, AdError::Configuration(_)));
    }

    #[tokio::test]
    async fn rejects_both_sources() {
        let client = HttpVastClient::new().unwrap();
        let config = PluginConfig {
            url: Some("https://example.com/vast.xml".to_string()),
            xml: Some("<VAST version=\"3.0\"></VAST>".to_string()),
            ..PluginConfig::default()
        };

        let err = fetch_response(&client, &config).await.unwrap_err();
        assert!(matches!(err, AdError::Configuration(_)));
    }

    #[tokio::test]
    async fn parses_inline_document() {
        let client = HttpVastClient::new().unwrap();
        let config = PluginConfig {
            xml: Some("<VAST version=\"3.0\"></VAST>".to_string()),
            ..PluginConfig::default()
        };

        let response = fetch_response(&client, &config).await.unwrap();
        assert_eq!(response.version, "3.0");
        assert!(response.ads.is_empty());
    }

    #[tokio::test]
    async fn unparseable_inline_document_is_a_configuration_error() {
        let client = HttpVastClient::new().unwrap();
        let config = PluginConfig {
            xml: Some("this is not XML".to_string()),
            ..PluginConfig::default()
        };

        let err = fetch_response(&client, &config).await.unwrap_err();
        assert!(matches!(err, AdError::Configuration(_)));
    }
}
